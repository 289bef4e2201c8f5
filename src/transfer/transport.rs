//! Catalog transport abstraction
//!
//! The four server endpoints the client depends on, behind a trait so the
//! session can run against a real HTTP server or an in-process one.

use async_trait::async_trait;
use bytes::Bytes;

use crate::catalog::{SortSpec, StoredFile};
use crate::error::Result;
use crate::recipient::RecipientTarget;

/// A file ready to be posted to `/upload`
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original file name, sent as the multipart file name
    pub display_name: String,
    /// Raw plaintext bytes
    pub bytes: Bytes,
    /// Resolved recipient, captured when the upload was requested
    pub recipient: RecipientTarget,
}

/// What the server reported for a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Storage name assigned by the server, when it reports one
    pub storage_name: Option<String>,
    pub message: String,
}

/// Client view of the file-sharing server
///
/// Implementations must be usable from several tasks at once; listing and
/// transfers are independent requests.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    /// `GET /get_files`, sorted by the server according to `sort`
    async fn list_files(&self, sort: SortSpec) -> Result<Vec<StoredFile>>;

    /// `GET /get_ips`
    async fn list_recipients(&self) -> Result<Vec<String>>;

    /// `POST /upload`
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt>;

    /// `GET /download/{storage_name}`, returning the stored bytes unchanged
    async fn fetch(&self, storage_name: &str) -> Result<Bytes>;

    /// Where requests go, for log lines
    fn endpoint(&self) -> String;
}
