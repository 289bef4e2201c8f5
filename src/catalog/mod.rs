//! Catalog module
//!
//! File listing contract shared by the client and the server: stored file
//! metadata, server-authoritative sorting, and the JSON shapes on the wire.

pub mod file;
pub mod format;
pub mod sort;
pub mod table;
pub mod wire;

pub use file::StoredFile;
pub use format::{format_size, format_timestamp, parse_size, parse_timestamp, TIMESTAMP_FORMAT};
pub use sort::{sort_files, SortColumn, SortDirection, SortSpec};
pub use table::FileTable;
pub use wire::{parse_file_list, parse_recipient_list, FileEntry, ListResponse, UploadResponse};
