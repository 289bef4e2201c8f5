//! Transfer state module
//!
//! Per-transfer state machines:
//!
//! ```text
//! upload:   Idle -> Selected -> Uploading -> {Succeeded, Failed}
//! download: Idle -> Fetching -> Decrypting -> {Succeeded, Failed}
//! ```
//!
//! Terminal states are left through [`UploadState::settle`] /
//! [`DownloadState::settle`], which put the client back where it can start
//! another transfer.

/// State of the upload form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    /// Nothing selected
    #[default]
    Idle,
    /// A file is chosen and waiting to be sent
    Selected,
    /// Request in flight
    Uploading,
    Succeeded,
    Failed,
}

impl UploadState {
    /// Check if the transfer has finished, either way
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Succeeded | UploadState::Failed)
    }

    pub fn can_transition_to(&self, next: UploadState) -> bool {
        use UploadState::*;
        matches!(
            (self, next),
            (Idle, Selected)
                | (Selected, Selected)
                | (Selected, Uploading)
                | (Uploading, Succeeded)
                | (Uploading, Failed)
                | (Succeeded, Idle)
                | (Succeeded, Selected)
                | (Failed, Idle)
                | (Failed, Selected)
        )
    }

    /// Leave a terminal state.
    ///
    /// A failed upload keeps its file, so the form goes back to `Selected`
    /// and the user can retry without choosing it again.
    pub fn settle(self, file_pending: bool) -> UploadState {
        match self {
            UploadState::Succeeded | UploadState::Failed if file_pending => UploadState::Selected,
            UploadState::Succeeded | UploadState::Failed => UploadState::Idle,
            other => other,
        }
    }
}

/// State of a single download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadState {
    #[default]
    Idle,
    /// Retrieving stored bytes
    Fetching,
    /// Running the cipher codec
    Decrypting,
    Succeeded,
    Failed,
}

impl DownloadState {
    /// Check if the transfer has finished, either way
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadState::Succeeded | DownloadState::Failed)
    }

    pub fn can_transition_to(&self, next: DownloadState) -> bool {
        use DownloadState::*;
        matches!(
            (self, next),
            (Idle, Fetching)
                | (Fetching, Decrypting)
                | (Fetching, Succeeded)
                | (Fetching, Failed)
                | (Decrypting, Succeeded)
                | (Decrypting, Failed)
                | (Succeeded, Idle)
                | (Failed, Idle)
        )
    }

    /// Leave a terminal state
    pub fn settle(self) -> DownloadState {
        if self.is_terminal() {
            DownloadState::Idle
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_happy_path() {
        let path = [
            UploadState::Idle,
            UploadState::Selected,
            UploadState::Uploading,
            UploadState::Succeeded,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
        assert_eq!(UploadState::Succeeded.settle(false), UploadState::Idle);
    }

    #[test]
    fn test_upload_cannot_skip_selection() {
        assert!(!UploadState::Idle.can_transition_to(UploadState::Uploading));
        assert!(!UploadState::Uploading.can_transition_to(UploadState::Selected));
    }

    #[test]
    fn test_failed_upload_keeps_selection() {
        assert!(UploadState::Failed.is_terminal());
        assert_eq!(UploadState::Failed.settle(true), UploadState::Selected);
        assert_eq!(UploadState::Uploading.settle(true), UploadState::Uploading);
    }

    #[test]
    fn test_download_paths() {
        assert!(DownloadState::Idle.can_transition_to(DownloadState::Fetching));
        assert!(DownloadState::Fetching.can_transition_to(DownloadState::Decrypting));
        assert!(DownloadState::Fetching.can_transition_to(DownloadState::Succeeded));
        assert!(DownloadState::Decrypting.can_transition_to(DownloadState::Failed));
        assert!(!DownloadState::Idle.can_transition_to(DownloadState::Decrypting));
        assert_eq!(DownloadState::Failed.settle(), DownloadState::Idle);
        assert_eq!(DownloadState::Fetching.settle(), DownloadState::Fetching);
    }
}
