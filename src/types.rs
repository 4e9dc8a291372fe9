/*!
 * Core types and data structures for treegauge
 */

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Description of a single filesystem entry.
///
/// A record is either a leaf (a file, carrying its compressed size) or a
/// directory (size zero, carrying its children). The constructors are the only
/// way to build one, so a record never holds both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    /// Base name of the entry
    #[serde(rename = "filename")]
    name: String,
    /// Last modification time as reported by the filesystem
    #[serde(rename = "last_modified_date")]
    modified_at: DateTime<Utc>,
    /// Size in bytes after gzip compression; zero for directories
    #[serde(rename = "file_size_gzipped")]
    compressed_size: u64,
    /// Children in enumeration order; `None` for leaves
    #[serde(rename = "files", skip_serializing_if = "Option::is_none")]
    children: Option<Vec<FileMetadata>>,
}

impl FileMetadata {
    /// Create a leaf record for a file
    pub fn leaf(name: impl Into<String>, modified_at: DateTime<Utc>, compressed_size: u64) -> Self {
        Self {
            name: name.into(),
            modified_at,
            compressed_size,
            children: None,
        }
    }

    /// Create a directory record from already finished child records
    pub fn directory(
        name: impl Into<String>,
        modified_at: DateTime<Utc>,
        children: Vec<FileMetadata>,
    ) -> Self {
        Self {
            name: name.into(),
            modified_at,
            compressed_size: 0,
            children: Some(children),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Child records; empty for leaves and for empty directories
    pub fn children(&self) -> &[FileMetadata] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_dir(&self) -> bool {
        self.children.is_some()
    }

    /// Take ownership of the child records
    pub fn into_children(self) -> Vec<FileMetadata> {
        self.children.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn leaf_has_no_children() {
        let leaf = FileMetadata::leaf("a.txt", epoch(), 25);
        assert!(!leaf.is_dir());
        assert!(leaf.children().is_empty());
        assert_eq!(leaf.compressed_size(), 25);
    }

    #[test]
    fn directory_size_is_zero() {
        let child = FileMetadata::leaf("a.txt", epoch(), 25);
        let dir = FileMetadata::directory("root", epoch(), vec![child.clone()]);
        assert!(dir.is_dir());
        assert_eq!(dir.compressed_size(), 0);
        assert_eq!(dir.children(), &[child]);
    }

    #[test]
    fn serializes_with_wire_names() {
        let dir = FileMetadata::directory(
            "root",
            epoch(),
            vec![
                FileMetadata::leaf("a.txt", epoch(), 25),
                FileMetadata::directory("b", epoch(), Vec::new()),
            ],
        );

        let json = serde_json::to_value(&dir).unwrap();
        assert_eq!(json["filename"], "root");
        assert_eq!(json["last_modified_date"], "2023-11-14T22:13:20Z");
        assert_eq!(json["file_size_gzipped"], 0);

        let files = json["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["file_size_gzipped"], 25);
        assert!(files[0].get("files").is_none());
        assert_eq!(files[1]["files"], serde_json::json!([]));
    }
}
