//! lanshare
//!
//! A LAN file-sharing client: upload files to a shared server, optionally
//! addressed to one peer, then list and download them with AES-256-CBC
//! decryption on the way out.

pub mod catalog;
pub mod cli;
pub mod crypto;
pub mod error;
pub mod recipient;
pub mod transfer;

pub use error::{ErrorKind, Result, ShareError};

pub use catalog::{
    format_size, parse_file_list, parse_recipient_list, sort_files, FileEntry, FileTable, ListResponse,
    SortColumn, SortDirection, SortSpec, StoredFile, UploadResponse,
};
pub use crypto::{decrypt, encrypt, EncryptedBlob, SharedKey, DEFAULT_SHARED_KEY};
pub use recipient::{PeerRegistry, RecipientDirectory, RecipientTarget, EVERYONE};
pub use transfer::{
    CatalogTransport, DownloadState, Intent, MemoryClient, MemoryServer, Notice, SessionOptions,
    TransferSession, UploadReceipt, UploadRequest, UploadState,
};

#[cfg(feature = "http")]
pub use transfer::HttpTransport;

pub use cli::{CliArgs, Command, Config, Console};
