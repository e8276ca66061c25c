use crate::deps::to_slash;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Workspace containment checks for patch targets.
///
/// Targets usually do not exist yet, so a path is resolved lexically first
/// and then its deepest existing ancestor is canonicalized. That catches both
/// `..` escapes and symlinks pointing out of the workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Canonical workspace root
    workspace_root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside workspace: {path} (workspace: {workspace})")]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl WorkspaceGuard {
    /// Create a guard for `workspace_root`, which must exist.
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let workspace_root = workspace_root.as_ref().canonicalize()?;
        Ok(Self { workspace_root })
    }

    /// Resolve a patch path to an absolute path inside the workspace.
    ///
    /// Relative paths are joined onto the root. The returned path has its
    /// existing prefix canonicalized; the remainder is kept as written.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        let normalized = normalize_lexically(&absolute);
        let resolved = canonicalize_existing_prefix(&normalized)?;

        if !resolved.starts_with(&self.workspace_root) || resolved == self.workspace_root {
            return Err(SafetyError::OutsideWorkspace {
                path: resolved,
                workspace: self.workspace_root.clone(),
            });
        }

        Ok(resolved)
    }

    /// Convenience wrapper for callers that only skip on failure.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).is_ok()
    }

    /// `/`-separated key of a resolved path relative to the workspace root.
    pub fn relative(&self, resolved: &Path) -> Option<String> {
        match resolved.strip_prefix(&self.workspace_root) {
            Ok(rel) if rel.as_os_str().is_empty() => None,
            Ok(rel) => Some(to_slash(rel)),
            Err(_) => None,
        }
    }

    /// Get the workspace root.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}

/// Fold `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the longest existing ancestor and re-append the rest.
fn canonicalize_existing_prefix(path: &Path) -> Result<PathBuf, SafetyError> {
    let mut existing = path;
    let mut rest = Vec::new();

    while existing.symlink_metadata().is_err() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize()?;
    for name in rest.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}
