//! Snapshot and patch-set data model.
//!
//! Both types carry a [`FileMap`] keyed by `/`-separated repository-relative
//! paths. A [`Snapshot`] is produced by a scan and holds literal file
//! contents plus presentation data; a [`PatchSet`] is decoded from an agent
//! response and holds per-file payloads (full content, surgical hunks, or a
//! blank deletion signal).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Repository-relative path to payload.
pub type FileMap = BTreeMap<String, String>;

/// Result of a workspace scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(
        rename = "short_description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(rename = "project_tree")]
    pub tree: String,
    pub files: FileMap,
    pub file_count: usize,
    pub token_count: usize,
    pub dir_count: usize,
}

impl Snapshot {
    /// Serialize to the pretty-printed JSON wire format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A set of proposed file changes, consumed once by the apply orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSet {
    #[serde(
        rename = "short_description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default)]
    pub files: FileMap,
}

impl PatchSet {
    pub fn new(description: Option<String>, files: FileMap) -> Self {
        Self { description, files }
    }

    /// Decode a patch set from JSON. Snapshot-only fields are accepted and
    /// ignored, so a snapshot document is also a valid patch set.
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

/// Rough token estimate used for budgets and statistics.
pub fn estimate_tokens(len: usize) -> usize {
    len / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_wire_names() {
        let mut files = FileMap::new();
        files.insert("src/main.go".to_string(), "package main\n".to_string());
        let snapshot = Snapshot {
            description: None,
            tree: "demo/\n└── src/\n".to_string(),
            files,
            file_count: 1,
            token_count: 3,
            dir_count: 1,
        };

        let json = snapshot.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("short_description").is_none());
        assert_eq!(value["project_tree"], "demo/\n└── src/\n");
        assert_eq!(value["files"]["src/main.go"], "package main\n");
        assert_eq!(value["file_count"], 1);
        assert_eq!(value["token_count"], 3);
        assert_eq!(value["dir_count"], 1);
    }

    #[test]
    fn test_patch_set_ignores_snapshot_fields() {
        let json = r#"{
            "short_description": "Rename helper",
            "project_tree": "ignored",
            "files": {"a.go": "package a\n"},
            "file_count": 1,
            "token_count": 2,
            "dir_count": 0
        }"#;

        let patch = PatchSet::from_json(json).unwrap();
        assert_eq!(patch.description.as_deref(), Some("Rename helper"));
        assert_eq!(patch.len(), 1);
        assert_eq!(patch.files["a.go"], "package a\n");
    }

    #[test]
    fn test_patch_set_files_default_to_empty() {
        let patch = PatchSet::from_json(r#"{"short_description": "nothing"}"#).unwrap();
        assert!(patch.is_empty());
    }
}
