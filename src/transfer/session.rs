//! Transfer session module
//!
//! Owns everything one client holds between requests: the active sort,
//! the last rendered file table, the recipient directory, the file
//! waiting to be uploaded, and the state of each transfer. Nothing here
//! persists across sessions.
//!
//! Every operation takes `&self`. Session state sits behind a mutex that
//! is only held for short synchronous updates and never across a request,
//! so listings, uploads and downloads can be in flight at the same time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::catalog::{FileTable, SortColumn, SortSpec, StoredFile};
use crate::crypto::{self, SharedKey};
use crate::error::{Result, ShareError};
use crate::recipient::{RecipientDirectory, RecipientTarget};
use crate::transfer::intent::{Intent, Notice};
use crate::transfer::state::{DownloadState, UploadState};
use crate::transfer::transport::{CatalogTransport, UploadReceipt, UploadRequest};

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Key used to decrypt downloads
    pub key: SharedKey,
    /// Directory downloads are saved into
    pub download_dir: PathBuf,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            key: SharedKey::default(),
            download_dir: PathBuf::from("."),
        }
    }
}

/// A file chosen for upload but not yet sent
#[derive(Debug, Clone)]
struct PendingFile {
    /// Distinguishes a file chosen while an earlier one was uploading
    id: u64,
    display_name: String,
    bytes: Bytes,
}

#[derive(Debug, Default)]
struct SessionState {
    sort: SortSpec,
    table: FileTable,
    /// Number of the latest listing request issued
    list_issued: u64,
    /// Number of the listing request the table reflects
    list_applied: u64,
    recipients: RecipientDirectory,
    pending: Option<PendingFile>,
    next_pending_id: u64,
    upload_state: UploadState,
    /// Downloads in flight, by storage name
    downloads: HashMap<String, DownloadState>,
}

impl SessionState {
    fn set_upload_state(&mut self, next: UploadState) {
        if !self.upload_state.can_transition_to(next) {
            warn!("Unexpected upload transition {:?} -> {:?}", self.upload_state, next);
        }
        debug!("Upload {:?} -> {:?}", self.upload_state, next);
        self.upload_state = next;
    }

    fn set_download_state(&mut self, storage_name: &str, next: DownloadState) {
        let current = self.downloads.get(storage_name).copied().unwrap_or_default();
        if !current.can_transition_to(next) {
            warn!("Unexpected download transition for {}: {:?} -> {:?}", storage_name, current, next);
        }
        debug!("Download of {} {:?} -> {:?}", storage_name, current, next);
        self.downloads.insert(storage_name.to_string(), next);
    }
}

/// One client's view of the server
pub struct TransferSession<T: CatalogTransport> {
    transport: T,
    options: SessionOptions,
    state: Mutex<SessionState>,
}

impl<T: CatalogTransport> TransferSession<T> {
    /// Create a session with the default sort and `Everyone` selected
    pub fn new(transport: T, options: SessionOptions) -> Self {
        debug!("New transfer session against {}", transport.endpoint());
        Self {
            transport,
            options,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn sort(&self) -> SortSpec {
        self.state().sort
    }

    /// Snapshot of the file table
    pub fn table(&self) -> FileTable {
        self.state().table.clone()
    }

    /// Snapshot of the listed files
    pub fn files(&self) -> Vec<StoredFile> {
        self.state().table.rows().to_vec()
    }

    /// Snapshot of the recipient directory
    pub fn recipients(&self) -> RecipientDirectory {
        self.state().recipients.clone()
    }

    pub fn selected_recipient(&self) -> RecipientTarget {
        self.state().recipients.selected().clone()
    }

    /// Display name of the file waiting to be uploaded
    pub fn pending_file(&self) -> Option<String> {
        self.state().pending.as_ref().map(|p| p.display_name.clone())
    }

    pub fn upload_state(&self) -> UploadState {
        self.state().upload_state
    }

    /// State of the download of `storage_name`; `Idle` when none is running
    pub fn download_state(&self, storage_name: &str) -> DownloadState {
        self.state().downloads.get(storage_name).copied().unwrap_or_default()
    }

    /// Number of downloads in flight
    pub fn active_downloads(&self) -> usize {
        self.state().downloads.len()
    }

    // ==================== Intents ====================

    /// Handle one user intent. Failures are reported in the returned notice.
    pub async fn dispatch(&self, intent: Intent) -> Notice {
        match intent {
            Intent::FileChosen { display_name, bytes } => {
                let size = bytes.len() as u64;
                match self.choose_file(display_name.clone(), bytes) {
                    Ok(()) => Notice::FileSelected { display_name, size },
                    Err(e) => Notice::Blocked(e.message().to_string()),
                }
            }
            Intent::SortToggled(column) => {
                let sort = self.toggle_sort(column);
                match self.refresh_files().await {
                    Ok(listed) => Notice::SortChanged { sort, listed },
                    Err(e) => Notice::ListingFailed(e.to_string()),
                }
            }
            Intent::RecipientChosen(target) => Notice::RecipientSelected(self.choose_recipient(target)),
            Intent::UploadRequested => match self.upload().await {
                Ok(receipt) => Notice::Uploaded(receipt),
                Err(e @ ShareError::ValidationError { .. }) => Notice::Blocked(e.message().to_string()),
                Err(e) => Notice::UploadFailed(e.to_string()),
            },
            Intent::DownloadRequested(file) => match self.download(&file).await {
                Ok(path) => {
                    let bytes = fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
                    Notice::Downloaded { path, bytes }
                }
                Err(e) => Notice::DownloadFailed {
                    display_name: file.display_name,
                    message: e.to_string(),
                },
            },
            Intent::RefreshFiles => match self.refresh_files().await {
                Ok(count) => Notice::FilesListed(count),
                Err(e) => Notice::ListingFailed(e.to_string()),
            },
            Intent::RefreshRecipients => match self.refresh_recipients().await {
                Ok(selection_reset) => {
                    let count = self.state().recipients.peers().len();
                    Notice::RecipientsRefreshed { count, selection_reset }
                }
                Err(e) => Notice::RecipientsUnavailable(e.to_string()),
            },
        }
    }

    // ==================== Catalog ====================

    /// Apply a header click to the active sort
    pub fn toggle_sort(&self, column: SortColumn) -> SortSpec {
        let mut state = self.state();
        state.sort = state.sort.toggled(column);
        debug!("Sort is now {}", state.sort);
        state.sort
    }

    pub fn set_sort(&self, sort: SortSpec) {
        self.state().sort = sort;
    }

    /// Re-list files with the active sort.
    ///
    /// On failure the table keeps its previous rows and records the error.
    /// A response that arrives after a newer listing was applied is dropped.
    pub async fn refresh_files(&self) -> Result<usize> {
        let (sort, issued) = {
            let mut state = self.state();
            state.list_issued += 1;
            (state.sort, state.list_issued)
        };

        let result = self.transport.list_files(sort).await;
        let outcome = match &result {
            Ok(files) => {
                info!("Listed {} files ({})", files.len(), sort);
                Ok(files.len())
            }
            Err(e) => {
                error!("Error fetching files: {}", e);
                Err(e.clone())
            }
        };

        let mut state = self.state();
        if issued > state.list_applied {
            state.list_applied = issued;
            state.table.apply(result);
        } else {
            debug!("Dropping stale listing #{} (table is at #{})", issued, state.list_applied);
        }
        outcome
    }

    /// Re-list recipients. Returns whether the selection fell back to `Everyone`.
    ///
    /// On failure the directory is left as it was.
    pub async fn refresh_recipients(&self) -> Result<bool> {
        match self.transport.list_recipients().await {
            Ok(peers) => {
                let selection_reset = self.state().recipients.refresh(peers);
                Ok(selection_reset)
            }
            Err(e) => {
                error!("Error fetching recipients: {}", e);
                Err(e)
            }
        }
    }

    /// Select a recipient; addresses not in the directory resolve to `Everyone`
    pub fn choose_recipient(&self, target: RecipientTarget) -> RecipientTarget {
        let selected = self.state().recipients.select(target).clone();
        debug!("Recipient selected: {}", selected);
        selected
    }

    // ==================== Upload ====================

    /// Stage a file for upload, replacing any earlier choice.
    ///
    /// Choosing a file while an upload is running stages it for the next
    /// upload without touching the one in flight.
    pub fn choose_file(&self, display_name: impl Into<String>, bytes: Bytes) -> Result<()> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(ShareError::validation_error_with_field("File has no name", "file"));
        }

        info!("Selected: {} ({} bytes)", display_name, bytes.len());
        let mut state = self.state();
        state.next_pending_id += 1;
        let id = state.next_pending_id;
        state.pending = Some(PendingFile { id, display_name, bytes });
        if state.upload_state != UploadState::Uploading {
            state.set_upload_state(UploadState::Selected);
        }
        Ok(())
    }

    /// Read a local file and stage it for upload under its file name
    pub async fn choose_file_path(&self, path: &Path) -> Result<()> {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ShareError::validation_error_with_field(format!("Not a file: {}", path.display()), "file"))?;

        let bytes = fs::read(path).await.map_err(|e| {
            ShareError::storage_error_full("Failed to read file", path.display().to_string(), e.to_string())
        })?;

        self.choose_file(display_name, Bytes::from(bytes))
    }

    /// Forget the staged file
    pub fn clear_selection(&self) {
        let mut state = self.state();
        state.pending = None;
        if state.upload_state != UploadState::Uploading {
            state.upload_state = UploadState::Idle;
        }
    }

    /// Send the staged file to the selected recipient.
    ///
    /// Fails with a validation error, before any request, when nothing is
    /// staged or another upload is running. On success the form is reset
    /// and the file list refreshed; on failure the staged file and
    /// recipient stay so the user can retry.
    pub async fn upload(&self) -> Result<UploadReceipt> {
        let (uploading_id, request) = {
            let mut state = self.state();
            if state.upload_state == UploadState::Uploading {
                warn!("Upload requested while another is in flight");
                return Err(ShareError::validation_error_with_field("An upload is already in progress.", "file"));
            }
            let pending = match &state.pending {
                Some(pending) => pending.clone(),
                None => {
                    warn!("Upload requested with no file selected");
                    return Err(ShareError::validation_error_with_field("Please select a file first.", "file"));
                }
            };

            let recipient = state.recipients.resolve(Some(state.recipients.selected()));
            state.set_upload_state(UploadState::Uploading);
            (
                pending.id,
                UploadRequest {
                    display_name: pending.display_name,
                    bytes: pending.bytes,
                    recipient,
                },
            )
        };

        match self.transport.upload(request).await {
            Ok(receipt) => {
                info!("{}", receipt.message);
                {
                    let mut state = self.state();
                    state.set_upload_state(UploadState::Succeeded);
                    if state.pending.as_ref().map(|p| p.id) == Some(uploading_id) {
                        state.pending = None;
                    }
                    state.recipients.reset();
                    let settled = state.upload_state.settle(state.pending.is_some());
                    state.upload_state = settled;
                }

                if let Err(e) = self.refresh_files().await {
                    warn!("Upload succeeded but re-listing failed: {}", e);
                }
                Ok(receipt)
            }
            Err(e) => {
                error!("Error uploading file: {}", e);
                let mut state = self.state();
                state.set_upload_state(UploadState::Failed);
                let settled = state.upload_state.settle(state.pending.is_some());
                state.upload_state = settled;
                Err(e)
            }
        }
    }

    // ==================== Download ====================

    /// Retrieve a file and return its plaintext without saving it
    pub async fn download_bytes(&self, file: &StoredFile) -> Result<Vec<u8>> {
        self.begin_download(file)?;
        let result = self.retrieve_plaintext(file).await;
        self.finish_download(file, result.is_ok());
        result
    }

    /// Download, decrypt, and save a file under its display name.
    ///
    /// A failure affects only this download; the file table and other
    /// transfers are untouched.
    pub async fn download(&self, file: &StoredFile) -> Result<PathBuf> {
        info!("Downloading {} as {}", file.storage_name, file.display_name);
        self.begin_download(file)?;

        let result = match self.retrieve_plaintext(file).await {
            Ok(plaintext) => save_plaintext(&self.options.download_dir, &file.save_name(), &plaintext).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(path) => info!("Saved {} to {}", file.display_name, path.display()),
            Err(e) => error!("Error downloading {}: {}", file.display_name, e),
        }
        self.finish_download(file, result.is_ok());

        result
    }

    fn begin_download(&self, file: &StoredFile) -> Result<()> {
        let mut state = self.state();
        if state.downloads.contains_key(&file.storage_name) {
            warn!("{} is already downloading", file.storage_name);
            return Err(ShareError::validation_error_with_field(
                format!("{} is already downloading.", file.display_name),
                "file",
            ));
        }
        state.set_download_state(&file.storage_name, DownloadState::Fetching);
        Ok(())
    }

    /// Fetch stored bytes and decrypt them if the server stored them encrypted
    async fn retrieve_plaintext(&self, file: &StoredFile) -> Result<Vec<u8>> {
        let stored = self.transport.fetch(&file.storage_name).await?;

        if !file.encrypted {
            debug!("{} is stored unencrypted, skipping decryption", file.storage_name);
            return Ok(stored.to_vec());
        }

        self.state()
            .set_download_state(&file.storage_name, DownloadState::Decrypting);
        crypto::decrypt(&stored, &self.options.key)
            .map_err(|e| e.with_context(format!("while decrypting {}", file.storage_name)))
    }

    fn finish_download(&self, file: &StoredFile, succeeded: bool) {
        let terminal = if succeeded {
            DownloadState::Succeeded
        } else {
            DownloadState::Failed
        };
        let mut state = self.state();
        state.set_download_state(&file.storage_name, terminal);
        debug!("Download of {} finished: {:?}", file.storage_name, terminal);
        if terminal.settle() == DownloadState::Idle {
            state.downloads.remove(&file.storage_name);
        }
    }
}

/// Write `contents` into `dir` as `name`, adding ` (n)` before the extension
/// if a file of that name already exists
pub async fn save_plaintext(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).await.map_err(|e| {
        ShareError::storage_error_full("Failed to create download directory", dir.display().to_string(), e.to_string())
    })?;

    let path = unique_path(dir, name).await;
    fs::write(&path, contents).await.map_err(|e| {
        ShareError::storage_error_full("Failed to save file", path.display().to_string(), e.to_string())
    })?;

    Ok(path)
}

async fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !fs::try_exists(&candidate).await.unwrap_or(false) {
        return candidate;
    }

    let as_path = Path::new(name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let extension = as_path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut n = 1u32;
    loop {
        let file_name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(file_name);
        if !fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }
        n += 1;
    }
}
