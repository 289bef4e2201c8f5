//! Stored file metadata

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::catalog::format::{format_size, format_timestamp};

/// A file known to the server.
///
/// `storage_name` identifies the file on the server and in download URLs.
/// `display_name` is what the uploader called it and what a download is
/// saved as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub storage_name: String,
    pub display_name: String,
    pub size_bytes: u64,
    /// Last modification time in the server's wall clock, if reported
    pub modified_at: Option<NaiveDateTime>,
    /// Whether the stored bytes are an encrypted blob
    pub encrypted: bool,
}

impl StoredFile {
    /// Create a new stored file entry
    pub fn new(
        storage_name: impl Into<String>,
        display_name: impl Into<String>,
        size_bytes: u64,
        modified_at: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            storage_name: storage_name.into(),
            display_name: display_name.into(),
            size_bytes,
            modified_at,
            encrypted: true,
        }
    }

    /// Mark whether the stored bytes are encrypted
    pub fn with_encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Human-readable size
    pub fn size_fmt(&self) -> String {
        format_size(self.size_bytes)
    }

    /// Human-readable modification time, empty when unknown
    pub fn modified_fmt(&self) -> String {
        self.modified_at.map(format_timestamp).unwrap_or_default()
    }

    /// Name to save a download under.
    ///
    /// Only the final path component of the display name is kept so a
    /// server-supplied name cannot escape the download directory.
    pub fn save_name(&self) -> String {
        let candidate = self
            .display_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();

        if candidate.is_empty() || candidate == "." || candidate == ".." {
            self.storage_name.clone()
        } else {
            candidate.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_name_uses_display_name() {
        let file = StoredFile::new("report.pdf_1a2b3c4d.enc", "report.pdf", 10, None);
        assert_eq!(file.save_name(), "report.pdf");
    }

    #[test]
    fn test_save_name_strips_directories() {
        let file = StoredFile::new("x.enc", "../../etc/passwd", 10, None);
        assert_eq!(file.save_name(), "passwd");

        let file = StoredFile::new("x.enc", "C:\\Users\\me\\notes.txt", 10, None);
        assert_eq!(file.save_name(), "notes.txt");
    }

    #[test]
    fn test_save_name_falls_back_to_storage_name() {
        let file = StoredFile::new("abc.enc", "dir/", 0, None);
        assert_eq!(file.save_name(), "abc.enc");

        let file = StoredFile::new("abc.enc", "..", 0, None);
        assert_eq!(file.save_name(), "abc.enc");
    }

    #[test]
    fn test_formatted_fields() {
        let modified = NaiveDateTime::parse_from_str("2024-03-01 12:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let file = StoredFile::new("a", "a", 2048, Some(modified));
        assert_eq!(file.size_fmt(), "2.0 KB");
        assert_eq!(file.modified_fmt(), "2024-03-01 12:30:00");
        assert!(file.encrypted);
        assert!(!file.with_encrypted(false).encrypted);
    }

    #[test]
    fn test_serde_keeps_timestamp() {
        let modified = NaiveDateTime::parse_from_str("2024-03-01 12:30:05", "%Y-%m-%d %H:%M:%S").unwrap();
        let file = StoredFile::new("notes.txt_0a1b2c3d.enc", "notes.txt", 42, Some(modified)).with_encrypted(false);

        let json = serde_json::to_string(&file).unwrap();
        let back: StoredFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, file);

        let unknown = StoredFile::new("a.enc", "a", 0, None);
        let back: StoredFile = serde_json::from_str(&serde_json::to_string(&unknown).unwrap()).unwrap();
        assert_eq!(back.modified_at, None);
    }
}
