//! Storage result types
//!
//! Defines result structures returned by storage operations.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fs::Metadata;
use std::time::UNIX_EPOCH;
use tokio::fs::File;

use crate::storage::path::RelativePath;

/// Kind of filesystem object behind an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    #[serde(rename = "file")]
    File,
    /// Serialized as `folder`, the value the file explorer expects.
    #[serde(rename = "folder")]
    Directory,
}

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Byte length for files, 0 for directories.
    pub size: u64,
    #[serde(serialize_with = "serialize_iso8601")]
    pub modified: DateTime<Utc>,
    pub path: RelativePath,
}

impl Entry {
    /// Build an entry from filesystem metadata.
    pub fn from_metadata(name: String, path: RelativePath, metadata: &Metadata) -> Self {
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        let size = match kind {
            EntryKind::Directory => 0,
            EntryKind::File => metadata.len(),
        };

        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(UNIX_EPOCH));

        Self {
            name,
            kind,
            size,
            modified,
            path,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// An open file ready to be sent to a client.
#[derive(Debug)]
pub struct FileDownload {
    pub file: File,
    pub filename: String,
    pub size: u64,
    pub path: RelativePath,
}

/// What a path resolved to when opened.
#[derive(Debug)]
pub enum Target {
    Directory(Vec<Entry>),
    File(FileDownload),
}

/// Millisecond-precision UTC timestamp, e.g. `2024-01-01T00:00:00.000Z`.
pub fn serialize_iso8601<S: Serializer>(
    time: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_serialization() {
        let entry = Entry {
            name: "q1.txt".into(),
            kind: EntryKind::File,
            size: 5,
            modified: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            path: RelativePath::parse("reports/q1.txt").unwrap(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "q1.txt",
                "type": "file",
                "size": 5,
                "modified": "2024-03-01T12:30:00.000Z",
                "path": "reports/q1.txt",
            })
        );
    }

    #[test]
    fn test_directory_kind_serializes_as_folder() {
        assert_eq!(
            serde_json::to_value(EntryKind::Directory).unwrap(),
            serde_json::json!("folder")
        );
    }
}
