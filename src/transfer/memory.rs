//! In-process server
//!
//! Implements the server side of the catalog contract in memory: uploads
//! are encrypted with the shared key and stored under an obfuscated name,
//! listings are filtered by recipient and stably sorted, and every request
//! marks its caller as an active peer. Each [`MemoryClient`] handle acts as
//! one client address.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Local, NaiveDateTime, Timelike};
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::catalog::{sort_files, SortSpec, StoredFile};
use crate::crypto::{self, SharedKey};
use crate::error::{Result, ShareError};
use crate::recipient::{PeerRegistry, RecipientTarget, DEFAULT_PEER_TIMEOUT};
use crate::transfer::transport::{CatalogTransport, UploadReceipt, UploadRequest};

/// One uploaded file as the server keeps it
#[derive(Debug, Clone)]
struct StoredRecord {
    file: StoredFile,
    sender: String,
    recipient: RecipientTarget,
    /// Stored bytes: an encrypted blob, or plaintext when encryption is off
    contents: Bytes,
}

#[derive(Debug)]
struct ServerState {
    /// Insertion order is the tie-break order for sorting
    records: Vec<StoredRecord>,
    peers: PeerRegistry,
    offline: bool,
}

/// Shared in-memory server
#[derive(Clone)]
pub struct MemoryServer {
    state: Arc<RwLock<ServerState>>,
    key: SharedKey,
    encrypt_uploads: bool,
}

impl MemoryServer {
    /// Server encrypting uploads with `key`
    pub fn new(key: SharedKey) -> Self {
        Self::with_options(key, true, DEFAULT_PEER_TIMEOUT)
    }

    /// Server with explicit encryption and peer-timeout settings
    pub fn with_options(key: SharedKey, encrypt_uploads: bool, peer_timeout: Duration) -> Self {
        info!(
            "In-memory server started (encryption: {}, peer timeout: {:?})",
            encrypt_uploads, peer_timeout
        );
        Self {
            state: Arc::new(RwLock::new(ServerState {
                records: Vec::new(),
                peers: PeerRegistry::new(peer_timeout),
                offline: false,
            })),
            key,
            encrypt_uploads,
        }
    }

    /// A client handle whose requests come from `addr`
    pub fn connect(&self, addr: impl Into<String>) -> MemoryClient {
        MemoryClient {
            server: self.clone(),
            addr: addr.into(),
        }
    }

    /// Make every request fail with a network error until switched back
    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.offline = offline;
        info!("In-memory server {}", if offline { "offline" } else { "online" });
    }

    /// Drop peers whose last request is older than the timeout
    pub async fn prune_peers(&self) -> usize {
        self.state.write().await.peers.prune(Instant::now())
    }

    /// Number of addresses the peer registry currently holds
    pub async fn peer_count(&self) -> usize {
        self.state.read().await.peers.len()
    }

    /// Number of stored files across all recipients
    pub async fn file_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Raw stored bytes, bypassing recipient checks
    pub async fn stored_bytes(&self, storage_name: &str) -> Option<Bytes> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|r| r.file.storage_name == storage_name)
            .map(|r| r.contents.clone())
    }

    /// Who uploaded a file
    pub async fn sender_of(&self, storage_name: &str) -> Option<String> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|r| r.file.storage_name == storage_name)
            .map(|r| r.sender.clone())
    }

    /// Who a file is addressed to
    pub async fn recipient_of(&self, storage_name: &str) -> Option<RecipientTarget> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|r| r.file.storage_name == storage_name)
            .map(|r| r.recipient.clone())
    }

    /// Lock state, rejecting the request when offline.
    ///
    /// Expired peers are dropped before the caller is recorded, so the
    /// registry only holds addresses seen within the timeout.
    async fn enter(&self, caller: &str, what: &str) -> Result<tokio::sync::RwLockWriteGuard<'_, ServerState>> {
        let mut state = self.state.write().await;
        if state.offline {
            warn!("{} from {} refused: server offline", what, caller);
            return Err(ShareError::network_error_with_address(
                format!("{} failed: server unreachable", what),
                "memory",
            ));
        }
        let now = Instant::now();
        state.peers.prune(now);
        state.peers.touch(caller, now);
        Ok(state)
    }

    async fn list_for(&self, caller: &str, sort: SortSpec) -> Result<Vec<StoredFile>> {
        let state = self.enter(caller, "Listing files").await?;

        let mut files: Vec<StoredFile> = state
            .records
            .iter()
            .filter(|r| r.recipient.admits(caller))
            .map(|r| r.file.clone())
            .collect();
        sort_files(&mut files, sort);

        debug!("Listing {} files for {} ({})", files.len(), caller, sort);
        Ok(files)
    }

    async fn recipients_for(&self, caller: &str) -> Result<Vec<String>> {
        let state = self.enter(caller, "Listing recipients").await?;
        Ok(state.peers.active(Instant::now()))
    }

    async fn store(&self, caller: &str, request: UploadRequest) -> Result<UploadReceipt> {
        let mut state = self.enter(caller, "Upload").await?;

        if request.display_name.trim().is_empty() {
            return Err(ShareError::validation_error_with_field("No selected file", "file"));
        }

        let mut suffix = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut suffix);

        let (storage_name, contents, message) = if self.encrypt_uploads {
            let blob = crypto::encrypt(&request.bytes, &self.key);
            (
                format!("{}_{}.enc", request.display_name, hex::encode(suffix)),
                Bytes::from(blob.to_bytes()),
                "File uploaded and encrypted successfully!",
            )
        } else {
            (
                format!("{}_{}", request.display_name, hex::encode(suffix)),
                request.bytes.clone(),
                "File uploaded successfully!",
            )
        };

        let file = StoredFile::new(
            storage_name.clone(),
            request.display_name.clone(),
            request.bytes.len() as u64,
            Some(now_to_second()),
        )
        .with_encrypted(self.encrypt_uploads);

        info!(
            "Stored {} as {} from {} for {}",
            request.display_name, storage_name, caller, request.recipient
        );

        state.records.push(StoredRecord {
            file,
            sender: caller.to_string(),
            recipient: request.recipient,
            contents,
        });

        Ok(UploadReceipt {
            storage_name: Some(storage_name),
            message: message.to_string(),
        })
    }

    async fn retrieve(&self, caller: &str, storage_name: &str) -> Result<Bytes> {
        let state = self.enter(caller, "Download").await?;

        let record = state
            .records
            .iter()
            .find(|r| r.file.storage_name == storage_name)
            .ok_or_else(|| {
                warn!("Download failed: {} not found", storage_name);
                ShareError::network_error_full("Download failed with status 404", storage_name, "File not found")
            })?;

        if !record.recipient.admits(caller) {
            warn!("Download failed: access denied for {}", caller);
            return Err(ShareError::network_error_full(
                "Download failed with status 403",
                storage_name,
                "Access denied",
            ));
        }

        Ok(record.contents.clone())
    }
}

/// Listing timestamps carry whole seconds only
fn now_to_second() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// One client of a [`MemoryServer`]
#[derive(Clone)]
pub struct MemoryClient {
    server: MemoryServer,
    addr: String,
}

impl MemoryClient {
    /// The address this client's requests come from
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn server(&self) -> &MemoryServer {
        &self.server
    }
}

#[async_trait]
impl CatalogTransport for MemoryClient {
    async fn list_files(&self, sort: SortSpec) -> Result<Vec<StoredFile>> {
        self.server.list_for(&self.addr, sort).await
    }

    async fn list_recipients(&self) -> Result<Vec<String>> {
        self.server.recipients_for(&self.addr).await
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        self.server.store(&self.addr, request).await
    }

    async fn fetch(&self, storage_name: &str) -> Result<Bytes> {
        self.server.retrieve(&self.addr, storage_name).await
    }

    fn endpoint(&self) -> String {
        format!("memory://{}", self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SortColumn, SortDirection};
    use crate::crypto::DEFAULT_SHARED_KEY;
    use crate::error::ErrorKind;

    fn request(name: &str, bytes: &[u8], recipient: RecipientTarget) -> UploadRequest {
        UploadRequest {
            display_name: name.to_string(),
            bytes: Bytes::copy_from_slice(bytes),
            recipient,
        }
    }

    #[tokio::test]
    async fn test_upload_encrypts_and_obfuscates_name() {
        let server = MemoryServer::new(DEFAULT_SHARED_KEY);
        let client = server.connect("10.0.0.1");

        let receipt = client
            .upload(request("notes.txt", b"hello world", RecipientTarget::Everyone))
            .await
            .unwrap();
        let storage_name = receipt.storage_name.unwrap();
        assert!(storage_name.starts_with("notes.txt_"));
        assert!(storage_name.ends_with(".enc"));
        assert_eq!(storage_name.len(), "notes.txt_".len() + 8 + ".enc".len());

        let stored = server.stored_bytes(&storage_name).await.unwrap();
        assert_ne!(&stored[..], b"hello world");
        assert_eq!(crypto::decrypt(&stored, &DEFAULT_SHARED_KEY).unwrap(), b"hello world");
        assert_eq!(server.sender_of(&storage_name).await.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_listing_filters_by_recipient() {
        let server = MemoryServer::new(DEFAULT_SHARED_KEY);
        let alice = server.connect("10.0.0.1");
        let bob = server.connect("10.0.0.2");

        alice.upload(request("public", b"p", RecipientTarget::Everyone)).await.unwrap();
        alice.upload(request("for-bob", b"b", RecipientTarget::address("10.0.0.2"))).await.unwrap();

        let for_bob = bob.list_files(SortSpec::default()).await.unwrap();
        assert_eq!(for_bob.len(), 2);

        let for_alice = alice.list_files(SortSpec::default()).await.unwrap();
        assert_eq!(for_alice.len(), 1);
        assert_eq!(for_alice[0].display_name, "public");
    }

    #[tokio::test]
    async fn test_download_access_checks() {
        let server = MemoryServer::new(DEFAULT_SHARED_KEY);
        let alice = server.connect("10.0.0.1");
        let carol = server.connect("10.0.0.3");

        let receipt = alice
            .upload(request("secret", b"s", RecipientTarget::address("10.0.0.2")))
            .await
            .unwrap();

        let err = carol.fetch(receipt.storage_name.as_deref().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("Access denied"));

        let err = carol.fetch("missing.enc").await.unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[tokio::test]
    async fn test_listing_sorts_stably() {
        let server = MemoryServer::new(DEFAULT_SHARED_KEY);
        let client = server.connect("10.0.0.1");
        client.upload(request("a", &[0u8; 100], RecipientTarget::Everyone)).await.unwrap();
        client.upload(request("b", &[0u8; 5], RecipientTarget::Everyone)).await.unwrap();
        client.upload(request("c", &[0u8; 100], RecipientTarget::Everyone)).await.unwrap();

        let files = client
            .list_files(SortSpec::new(SortColumn::Size, SortDirection::Desc))
            .await
            .unwrap();
        let names: Vec<_> = files.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_recipients_are_recent_callers() {
        let server = MemoryServer::new(DEFAULT_SHARED_KEY);
        let alice = server.connect("10.0.0.1");
        let bob = server.connect("10.0.0.2");

        bob.list_files(SortSpec::default()).await.unwrap();
        let peers = alice.list_recipients().await.unwrap();
        assert_eq!(peers, vec!["10.0.0.2", "10.0.0.1"]);
    }

    #[tokio::test]
    async fn test_expired_peers_drop_out() {
        let server = MemoryServer::with_options(DEFAULT_SHARED_KEY, true, Duration::ZERO);
        let bob = server.connect("10.0.0.2");
        bob.list_files(SortSpec::default()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(server.prune_peers().await, 1);
    }

    #[tokio::test]
    async fn test_requests_prune_expired_peers() {
        let server = MemoryServer::with_options(DEFAULT_SHARED_KEY, true, Duration::from_millis(20));
        let bob = server.connect("10.0.0.2");
        let alice = server.connect("10.0.0.1");

        bob.list_files(SortSpec::default()).await.unwrap();
        assert_eq!(server.peer_count().await, 1);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let peers = alice.list_recipients().await.unwrap();
        assert_eq!(peers, vec!["10.0.0.1"]);
        assert_eq!(server.peer_count().await, 1);
    }

    #[tokio::test]
    async fn test_offline_server_fails_with_network_error() {
        let server = MemoryServer::new(DEFAULT_SHARED_KEY);
        let client = server.connect("10.0.0.1");
        server.set_offline(true).await;

        let err = client.list_files(SortSpec::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);

        server.set_offline(false).await;
        assert!(client.list_files(SortSpec::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_plaintext_variant() {
        let server = MemoryServer::with_options(DEFAULT_SHARED_KEY, false, DEFAULT_PEER_TIMEOUT);
        let client = server.connect("10.0.0.1");
        let receipt = client
            .upload(request("raw.txt", b"plain", RecipientTarget::Everyone))
            .await
            .unwrap();

        let files = client.list_files(SortSpec::default()).await.unwrap();
        assert!(!files[0].encrypted);
        let bytes = client.fetch(&receipt.storage_name.unwrap()).await.unwrap();
        assert_eq!(&bytes[..], b"plain");
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let server = MemoryServer::new(DEFAULT_SHARED_KEY);
        let client = server.connect("10.0.0.1");
        let err = client
            .upload(request("  ", b"x", RecipientTarget::Everyone))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(server.file_count().await, 0);
    }
}
