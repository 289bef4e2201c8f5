//! File table view model
//!
//! Holds the last successfully fetched listing. A failed fetch keeps the
//! existing rows and only records an error to show alongside them.

use crate::catalog::file::StoredFile;
use crate::error::ShareError;

#[derive(Debug, Clone, Default)]
pub struct FileTable {
    rows: Vec<StoredFile>,
    error: Option<String>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows on success, keep them and record the error on failure.
    ///
    /// Returns `true` when the rows were replaced.
    pub fn apply(&mut self, result: Result<Vec<StoredFile>, ShareError>) -> bool {
        match result {
            Ok(rows) => {
                self.rows = rows;
                self.error = None;
                true
            }
            Err(err) => {
                self.error = Some(err.to_string());
                false
            }
        }
    }

    pub fn rows(&self) -> &[StoredFile] {
        &self.rows
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row by storage name
    pub fn find(&self, storage_name: &str) -> Option<&StoredFile> {
        self.rows.iter().find(|f| f.storage_name == storage_name)
    }

    /// Look up a row by its 1-based position as rendered
    pub fn get(&self, position: usize) -> Option<&StoredFile> {
        position.checked_sub(1).and_then(|i| self.rows.get(i))
    }

    /// Text rows: `#`, name, size, modified
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);

        if self.rows.is_empty() {
            if self.error.is_none() {
                lines.push("No files found".to_string());
            }
        } else {
            let width = self
                .rows
                .iter()
                .map(|f| f.display_name.chars().count())
                .max()
                .unwrap_or(0)
                .max(4);

            lines.push(format!("{:>3}  {:<width$}  {:>10}  {}", "#", "Name", "Size", "Modified", width = width));
            for (index, file) in self.rows.iter().enumerate() {
                lines.push(format!(
                    "{:>3}  {:<width$}  {:>10}  {}",
                    index + 1,
                    file.display_name,
                    file.size_fmt(),
                    file.modified_fmt(),
                    width = width
                ));
            }
        }

        if let Some(error) = &self.error {
            lines.push(format!("Error loading files: {}", error));
        }

        lines
    }
}
