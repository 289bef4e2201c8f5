//! Transfer module
//!
//! Upload and download orchestration on top of a [`CatalogTransport`].

pub mod intent;
pub mod memory;
pub mod session;
pub mod state;
pub mod transport;

#[cfg(feature = "http")]
pub mod http;

pub use intent::{Intent, Notice};
pub use memory::{MemoryClient, MemoryServer};
pub use session::{SessionOptions, TransferSession};
pub use state::{DownloadState, UploadState};
pub use transport::{CatalogTransport, UploadReceipt, UploadRequest};

#[cfg(feature = "http")]
pub use http::HttpTransport;
