//! User intents and the notices they produce
//!
//! UI code translates clicks, drops and key presses into [`Intent`]s and
//! shows the resulting [`Notice`]. No intent can fail the session; errors
//! come back as notices.

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;

use crate::catalog::{SortColumn, SortSpec, StoredFile};
use crate::recipient::RecipientTarget;
use crate::transfer::transport::UploadReceipt;

#[derive(Debug, Clone)]
pub enum Intent {
    /// A file was picked or dropped
    FileChosen { display_name: String, bytes: Bytes },
    /// A column header was clicked
    SortToggled(SortColumn),
    /// A recipient was picked in the selector
    RecipientChosen(RecipientTarget),
    UploadRequested,
    DownloadRequested(StoredFile),
    RefreshFiles,
    RefreshRecipients,
}

/// Outcome of handling an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    FileSelected { display_name: String, size: u64 },
    /// The sort changed and the re-list succeeded; a failed re-list is `ListingFailed`
    SortChanged { sort: SortSpec, listed: usize },
    RecipientSelected(RecipientTarget),
    FilesListed(usize),
    /// The list request failed; previous rows are still shown
    ListingFailed(String),
    RecipientsRefreshed { count: usize, selection_reset: bool },
    /// The recipient request failed; the selector is unchanged
    RecipientsUnavailable(String),
    Uploaded(UploadReceipt),
    UploadFailed(String),
    /// Rejected before any request was made; needs the user's attention
    Blocked(String),
    Downloaded { path: PathBuf, bytes: u64 },
    DownloadFailed { display_name: String, message: String },
}

impl Notice {
    /// Whether this notice reports a problem
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::ListingFailed(_)
                | Notice::RecipientsUnavailable(_)
                | Notice::UploadFailed(_)
                | Notice::Blocked(_)
                | Notice::DownloadFailed { .. }
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::FileSelected { display_name, .. } => write!(f, "Selected: {}", display_name),
            Notice::SortChanged { sort, .. } => write!(f, "Sorted by {}", sort),
            Notice::RecipientSelected(target) => write!(f, "Recipient: {}", target),
            Notice::FilesListed(count) => write!(f, "{} files", count),
            Notice::ListingFailed(message) => write!(f, "Error loading files: {}", message),
            Notice::RecipientsRefreshed { count, selection_reset } => {
                if *selection_reset {
                    write!(f, "{} recipients; previous recipient is gone, sending to Everyone", count)
                } else {
                    write!(f, "{} recipients", count)
                }
            }
            Notice::RecipientsUnavailable(message) => write!(f, "Error loading recipients: {}", message),
            Notice::Uploaded(receipt) => f.write_str(&receipt.message),
            Notice::UploadFailed(message) => write!(f, "Error uploading file: {}", message),
            Notice::Blocked(message) => f.write_str(message),
            Notice::Downloaded { path, .. } => write!(f, "Saved {}", path.display()),
            Notice::DownloadFailed { display_name, message } => {
                write!(f, "Error downloading {}: {}", display_name, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_notices() {
        assert!(Notice::Blocked("Please select a file first.".into()).is_error());
        assert!(!Notice::FilesListed(3).is_error());
    }

    #[test]
    fn test_notice_display() {
        let notice = Notice::RecipientsRefreshed { count: 2, selection_reset: true };
        assert!(notice.to_string().contains("Everyone"));
        assert_eq!(Notice::ListingFailed("boom".into()).to_string(), "Error loading files: boom");
    }
}
