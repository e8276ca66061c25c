//! Local pre-apply backups under `<root>/.ctxsnap/backups/<id>/`.
//!
//! Each backup stores the previous content of every target that existed and
//! a `manifest.json` describing what was saved. `restore` puts the workspace
//! back the way it was before the patch.

use super::errors::ApplyError;
use super::orchestrator::{PatchTargets, Versioning};
use crate::edit::atomic_write;
use crate::safety::WorkspaceGuard;
use crate::snapshot::PatchSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

pub const BACKUP_DIR: &str = ".ctxsnap/backups";
const MANIFEST: &str = "manifest.json";
const FILES_DIR: &str = "files";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupManifest {
    pub id: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub entries: Vec<BackupEntry>,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub path: String,
    /// Whether the file existed before the patch
    pub existed: bool,
}

/// Versioning collaborator that keeps copies on local disk.
#[derive(Debug, Default, Clone)]
pub struct LocalBackup;

impl LocalBackup {
    pub fn new() -> Self {
        Self
    }

    fn backup_root(root: &Path, id: &str) -> PathBuf {
        root.join(BACKUP_DIR).join(id)
    }

    fn read_manifest(root: &Path, id: &str) -> Result<BackupManifest, ApplyError> {
        if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) {
            return Err(ApplyError::UnknownBackup(id.to_string()));
        }
        let path = Self::backup_root(root, id).join(MANIFEST);
        let raw = fs::read_to_string(&path)
            .map_err(|_| ApplyError::UnknownBackup(id.to_string()))?;
        serde_json::from_str(&raw)
            .map_err(|e| ApplyError::Backup(format!("corrupt manifest {}: {e}", path.display())))
    }

    fn write_manifest(root: &Path, manifest: &BackupManifest) -> Result<(), ApplyError> {
        let path = Self::backup_root(root, &manifest.id).join(MANIFEST);
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| ApplyError::Backup(e.to_string()))?;
        atomic_write(&path, json.as_bytes())
            .map_err(|e| ApplyError::Backup(format!("{}: {e}", path.display())))
    }

    /// Known backup ids, oldest first.
    pub fn list(root: &Path) -> Vec<String> {
        let mut ids: Vec<String> = fs::read_dir(root.join(BACKUP_DIR))
            .into_iter()
            .flatten()
            .filter_map(Result::ok)
            .filter(|entry| entry.path().join(MANIFEST).is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        ids.sort();
        ids
    }

    /// Put every file recorded in backup `id` back in place. Files that did
    /// not exist before the patch are removed. Returns the restored paths.
    pub fn restore(root: &Path, id: &str) -> Result<Vec<String>, ApplyError> {
        let manifest = Self::read_manifest(root, id)?;
        let guard = WorkspaceGuard::new(root).map_err(|_| ApplyError::Root(root.to_path_buf()))?;
        let saved = Self::backup_root(root, id).join(FILES_DIR);

        let mut restored = Vec::new();
        for entry in &manifest.entries {
            // Backups only record normalized keys
            let target = match guard.resolve(&entry.path) {
                Ok(target) if guard.relative(&target).as_deref() == Some(entry.path.as_str()) => {
                    target
                }
                _ => {
                    tracing::warn!(path = %entry.path, "skipping malformed backup entry");
                    continue;
                }
            };

            if entry.existed {
                let content = fs::read(saved.join(&entry.path)).map_err(|e| {
                    ApplyError::Backup(format!("missing saved copy of {}: {e}", entry.path))
                })?;
                atomic_write(&target, &content)
                    .map_err(|e| ApplyError::Backup(format!("{}: {e}", entry.path)))?;
            } else if target.exists() {
                fs::remove_file(&target)
                    .map_err(|e| ApplyError::Backup(format!("{}: {e}", entry.path)))?;
            }
            restored.push(entry.path.clone());
        }

        tracing::info!(id, files = restored.len(), "backup restored");
        Ok(restored)
    }
}

/// `<UTC timestamp>-<8 hex digits of the patch hash>`
fn backup_id(now: DateTime<Utc>, patch: &PatchSet) -> String {
    let mut hashed = String::new();
    for (path, content) in &patch.files {
        hashed.push_str(path);
        hashed.push('\0');
        hashed.push_str(content);
        hashed.push('\0');
    }
    let hash = xxh3_64(hashed.as_bytes());
    format!("{}-{:08x}", now.format("%Y%m%dT%H%M%S%.3fZ"), hash as u32)
}

impl Versioning for LocalBackup {
    fn backup(&mut self, root: &Path, patch: &PatchSet) -> Result<String, ApplyError> {
        let now = Utc::now();
        let id = backup_id(now, patch);
        let targets = PatchTargets::new(root)?;
        let saved = Self::backup_root(root, &id).join(FILES_DIR);

        // Keyed by the normalized relative path, one copy per file
        let mut entries: Vec<BackupEntry> = Vec::new();
        for path in patch.files.keys() {
            // Skipped targets are never written, nothing to save
            let Ok((target, rel)) = targets.resolve(path) else {
                continue;
            };
            if entries.iter().any(|entry| entry.path == rel) {
                continue;
            }

            let existed = target.is_file();
            if existed {
                let content = fs::read(&target)
                    .map_err(|e| ApplyError::Backup(format!("{path}: {e}")))?;
                atomic_write(&saved.join(&rel), &content)
                    .map_err(|e| ApplyError::Backup(format!("{rel}: {e}")))?;
            }
            entries.push(BackupEntry { path: rel, existed });
        }

        let manifest = BackupManifest {
            id: id.clone(),
            created: now,
            description: patch.description.clone(),
            entries,
            applied: false,
        };
        Self::write_manifest(root, &manifest)?;

        tracing::debug!(id = %id, files = manifest.entries.len(), "backup created");
        Ok(id)
    }

    fn mark_applied(&mut self, root: &Path, id: &str) -> Result<(), ApplyError> {
        let mut manifest = Self::read_manifest(root, id)?;
        manifest.applied = true;
        Self::write_manifest(root, &manifest)
    }
}
