//! JSON shapes exchanged with the server
//!
//! `/get_files` answers with either an array of detailed entries or, from
//! older server variants, an array of bare names. `/upload` answers with
//! `{message, file?}` on success and `{error}` on failure.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::file::StoredFile;
use crate::catalog::format::{format_size, format_timestamp, parse_size, parse_timestamp, timestamp_from_epoch};
use crate::error::{Result, ShareError};

/// One row of a detailed `/get_files` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Storage name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_fmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_fmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
}

impl FileEntry {
    /// Convert to the client model, filling gaps from the formatted fields
    pub fn into_stored_file(self, assume_encrypted: bool) -> StoredFile {
        let size_bytes = self
            .size
            .or_else(|| self.size_fmt.as_deref().and_then(parse_size))
            .unwrap_or(0);

        let modified_at = self
            .modified_fmt
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| self.modified.and_then(timestamp_from_epoch));

        let display_name = self
            .original_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.name.clone());

        StoredFile {
            storage_name: self.name,
            display_name,
            size_bytes,
            modified_at,
            encrypted: self.encrypted.unwrap_or(assume_encrypted),
        }
    }
}

impl From<&StoredFile> for FileEntry {
    fn from(file: &StoredFile) -> Self {
        Self {
            name: file.storage_name.clone(),
            original_name: Some(file.display_name.clone()),
            size: Some(file.size_bytes),
            modified: None,
            size_fmt: Some(format_size(file.size_bytes)),
            modified_fmt: file.modified_at.map(format_timestamp),
            encrypted: Some(file.encrypted),
        }
    }
}

/// Any accepted `/get_files` body
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse {
    Detailed(Vec<FileEntry>),
    Legacy(Vec<String>),
    Error { error: String },
}

impl ListResponse {
    pub fn into_files(self, assume_encrypted: bool) -> Result<Vec<StoredFile>> {
        match self {
            ListResponse::Detailed(entries) => Ok(entries
                .into_iter()
                .map(|e| e.into_stored_file(assume_encrypted))
                .collect()),
            ListResponse::Legacy(names) => {
                debug!("Server sent legacy name-only listing ({} entries)", names.len());
                Ok(names
                    .into_iter()
                    .map(|n| StoredFile::new(n.clone(), n, 0, None).with_encrypted(assume_encrypted))
                    .collect())
            }
            ListResponse::Error { error } => {
                warn!("Server reported listing error: {}", error);
                Err(ShareError::network_error_with_address(error, "/get_files"))
            }
        }
    }
}

/// Parse a `/get_files` body
pub fn parse_file_list(body: &str, assume_encrypted: bool) -> Result<Vec<StoredFile>> {
    let response: ListResponse = serde_json::from_str(body).map_err(|e| {
        ShareError::protocol_error_with_source("Unexpected /get_files response shape", e.to_string())
    })?;
    response.into_files(assume_encrypted)
}

/// Parse a `/get_ips` body
pub fn parse_recipient_list(body: &str) -> Result<Vec<String>> {
    serde_json::from_str::<Vec<String>>(body).map_err(|e| {
        ShareError::protocol_error_with_source("Unexpected /get_ips response shape", e.to_string())
    })
}

/// Body of an `/upload` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileEntry>,
}

impl UploadResponse {
    /// Success message and the storage name, or the server-reported error
    pub fn into_outcome(self) -> Result<(String, Option<String>)> {
        if let Some(error) = self.error {
            return Err(ShareError::network_error_with_address(error, "/upload"));
        }
        let message = self
            .message
            .unwrap_or_else(|| "File uploaded successfully!".to_string());
        Ok((message, self.file.map(|f| f.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_detailed_listing() {
        let body = r#"[
            {"name": "notes.txt_0a1b2c3d.enc", "original_name": "notes.txt", "size": 32,
             "created": 1700000000.0, "modified": 1700000000.0, "accessed": 1700000000.0,
             "size_fmt": "32.0 B", "modified_fmt": "2023-11-14 22:13:20", "created_fmt": "x"}
        ]"#;
        let files = parse_file_list(body, true).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].storage_name, "notes.txt_0a1b2c3d.enc");
        assert_eq!(files[0].display_name, "notes.txt");
        assert_eq!(files[0].size_bytes, 32);
        assert_eq!(files[0].modified_fmt(), "2023-11-14 22:13:20");
        assert!(files[0].encrypted);
    }

    #[test]
    fn test_parse_minimal_entry_recovers_size() {
        let body = r#"[{"name": "a.enc", "original_name": "a", "size_fmt": "1.5 KB", "modified_fmt": "2024-01-01 00:00:00"}]"#;
        let files = parse_file_list(body, true).unwrap();
        assert_eq!(files[0].size_bytes, 1536);
    }

    #[test]
    fn test_parse_legacy_listing() {
        let files = parse_file_list(r#"["one.bin", "two.bin"]"#, false).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].storage_name, "two.bin");
        assert_eq!(files[1].display_name, "two.bin");
        assert!(!files[1].encrypted);
    }

    #[test]
    fn test_encrypted_flag_overrides_default() {
        let body = r#"[{"name": "plain.txt", "encrypted": false}]"#;
        let files = parse_file_list(body, true).unwrap();
        assert!(!files[0].encrypted);
    }

    #[test]
    fn test_empty_listing() {
        assert!(parse_file_list("[]", true).unwrap().is_empty());
    }

    #[test]
    fn test_server_error_body() {
        let err = parse_file_list(r#"{"error": "disk on fire"}"#, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_malformed_listing_is_protocol_error() {
        let err = parse_file_list(r#"{"files": []}"#, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);

        let err = parse_file_list("<html>", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_parse_recipient_list() {
        let ips = parse_recipient_list(r#"["192.168.1.10", "192.168.1.42"]"#).unwrap();
        assert_eq!(ips, vec!["192.168.1.10", "192.168.1.42"]);
        assert_eq!(parse_recipient_list("{}").unwrap_err().kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_upload_response_outcomes() {
        let ok: UploadResponse = serde_json::from_str(
            r#"{"message": "File uploaded and encrypted successfully!", "file": {"name": "x_1.enc", "original_name": "x"}}"#,
        )
        .unwrap();
        let (message, storage) = ok.into_outcome().unwrap();
        assert_eq!(message, "File uploaded and encrypted successfully!");
        assert_eq!(storage.as_deref(), Some("x_1.enc"));

        let failed: UploadResponse = serde_json::from_str(r#"{"error": "Failed to get file info"}"#).unwrap();
        assert_eq!(failed.into_outcome().unwrap_err().kind(), ErrorKind::Network);
    }

    #[test]
    fn test_entry_from_stored_file() {
        let file = StoredFile::new("s.enc", "s", 2048, parse_timestamp("2024-02-02 02:02:02"));
        let entry = FileEntry::from(&file);
        assert_eq!(entry.size_fmt.as_deref(), Some("2.0 KB"));
        assert_eq!(entry.into_stored_file(false), file);
    }
}
