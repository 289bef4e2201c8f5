//! Sort specification module
//!
//! The client sends its single active [`SortSpec`] with every list request;
//! the server applies it with a stable sort so equal keys keep the order the
//! server holds them in.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::file::StoredFile;
use crate::error::ShareError;

/// Column a listing can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    /// Display name, compared byte-wise (case-sensitive, `B` < `a`).
    ///
    /// Servers that sort on the storage name (`{name}_{suffix}.enc`) can
    /// order prefix names differently: `"a"` sorts before `"a b"` here but
    /// after it by storage name, since `'_'` > `' '`.
    Name,
    /// Size in bytes, numeric
    Size,
    /// Modification time, chronological; unknown times sort first
    Modified,
}

impl SortColumn {
    /// Query-string form
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Size => "size",
            SortColumn::Modified => "modified",
        }
    }

    /// Parse a query value, falling back to `name` like the server does
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(SortColumn::Name)
    }

    fn compare(&self, a: &StoredFile, b: &StoredFile) -> Ordering {
        match self {
            SortColumn::Name => a.display_name.as_bytes().cmp(b.display_name.as_bytes()),
            SortColumn::Size => a.size_bytes.cmp(&b.size_bytes),
            SortColumn::Modified => a.modified_at.cmp(&b.modified_at),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortColumn::Name),
            "size" => Ok(SortColumn::Size),
            "modified" => Ok(SortColumn::Modified),
            other => Err(ShareError::validation_error_with_field(
                format!("Unknown sort column '{}'", other),
                "sort",
            )),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Parse a query value; anything other than `desc` is ascending
    pub fn parse_lenient(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(ShareError::validation_error_with_field(
                format!("Unknown sort order '{}'", other),
                "order",
            )),
        }
    }
}

/// The single active sort of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// The sort after the user clicks `column`.
    ///
    /// Clicking the active column flips the direction; clicking another
    /// column makes it active in ascending order.
    pub fn toggled(self, column: SortColumn) -> Self {
        if self.column == column {
            Self::new(column, self.direction.reversed())
        } else {
            Self::new(column, SortDirection::Asc)
        }
    }

    /// `sort` and `order` query parameters for `/get_files`
    pub fn query_pairs(&self) -> [(&'static str, &'static str); 2] {
        [("sort", self.column.as_str()), ("order", self.direction.as_str())]
    }

    /// Build from raw query values, falling back to `name`/`asc`
    pub fn from_query(sort: Option<&str>, order: Option<&str>) -> Self {
        Self {
            column: sort.map(SortColumn::parse_lenient).unwrap_or(SortColumn::Name),
            direction: order.map(SortDirection::parse_lenient).unwrap_or_default(),
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(SortColumn::Name, SortDirection::Asc)
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction)
    }
}

/// Stable in-place sort.
///
/// Descending order reverses the comparison rather than the result, so
/// entries with equal keys keep their relative order in both directions.
pub fn sort_files(files: &mut [StoredFile], spec: SortSpec) {
    match spec.direction {
        SortDirection::Asc => files.sort_by(|a, b| spec.column.compare(a, b)),
        SortDirection::Desc => files.sort_by(|a, b| spec.column.compare(b, a)),
    }
}
