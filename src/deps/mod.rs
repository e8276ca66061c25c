//! One-hop dependency expansion for smart scans.
//!
//! Selected source files are parsed at the import level, the imports are
//! mapped to package directories by the ecosystem's own tooling, and every
//! source file directly inside a package directory under the workspace root
//! joins the selection. Files added this way are not scanned again.
//!
//! Failures are never fatal: the expansion is simply empty.

pub mod cargo;
pub mod errors;
pub mod go;

pub use cargo::CargoWorkspace;
pub use errors::DepsError;
pub use go::GoModules;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A language ecosystem that can name and locate its packages.
pub trait Ecosystem {
    fn name(&self) -> &'static str;

    /// Extension (without dot) of files this ecosystem parses.
    fn source_extension(&self) -> &'static str;

    /// Import paths named by one source file.
    fn imports(&self, source: &str) -> Vec<String>;

    /// Package directories for `imports`, in any order. Directories outside
    /// the workspace are allowed; the caller filters them.
    fn locate(&self, root: &Path, imports: &[String]) -> Result<Vec<PathBuf>, DepsError>;
}

/// Which ecosystem drives smart expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcosystemChoice {
    /// Go when `go.mod` exists at the root, else Cargo when `Cargo.toml` does
    #[default]
    Auto,
    Go,
    Cargo,
    None,
}

impl EcosystemChoice {
    pub fn detect(self, root: &Path) -> Option<Box<dyn Ecosystem>> {
        match self {
            EcosystemChoice::Go => Some(Box::new(GoModules)),
            EcosystemChoice::Cargo => Some(Box::new(CargoWorkspace)),
            EcosystemChoice::None => None,
            EcosystemChoice::Auto => {
                if root.join("go.mod").is_file() {
                    Some(Box::new(GoModules))
                } else if root.join("Cargo.toml").is_file() {
                    Some(Box::new(CargoWorkspace))
                } else {
                    None
                }
            }
        }
    }
}

/// Expand `selected` with the detected ecosystem; empty when none applies.
pub fn resolve_auto(root: &Path, selected: &[String], choice: EcosystemChoice) -> Vec<String> {
    match choice.detect(root) {
        Some(ecosystem) => resolve(root, selected, ecosystem.as_ref()),
        None => {
            tracing::debug!(?choice, "no ecosystem for smart expansion");
            Vec::new()
        }
    }
}

/// Relative paths of source files in packages imported by `selected`.
pub fn resolve(root: &Path, selected: &[String], ecosystem: &dyn Ecosystem) -> Vec<String> {
    let ext = ecosystem.source_extension();

    let mut imports = BTreeSet::new();
    for rel in selected {
        if !has_extension(Path::new(rel), ext) {
            continue;
        }
        match fs::read_to_string(root.join(rel)) {
            Ok(source) => imports.extend(ecosystem.imports(&source)),
            Err(e) => tracing::debug!(path = %rel, "cannot read selected file: {e}"),
        }
    }

    if imports.is_empty() {
        return Vec::new();
    }

    let imports: Vec<String> = imports.into_iter().collect();
    let dirs = match ecosystem.locate(root, &imports) {
        Ok(dirs) => dirs,
        Err(e) => {
            tracing::warn!(ecosystem = ecosystem.name(), "dependency resolution failed: {e}");
            return Vec::new();
        }
    };

    let Ok(canonical_root) = root.canonicalize() else {
        return Vec::new();
    };

    let mut expanded = BTreeSet::new();
    for dir in dirs {
        let Ok(dir) = dir.canonicalize() else {
            continue;
        };
        if !dir.starts_with(&canonical_root) {
            continue;
        }

        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() || !has_extension(entry.path(), ext) {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&canonical_root) {
                expanded.insert(to_slash(rel));
            }
        }
    }

    tracing::debug!(
        ecosystem = ecosystem.name(),
        imports = imports.len(),
        added = expanded.len(),
        "smart expansion"
    );
    expanded.into_iter().collect()
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// `/`-separated form of a relative path.
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
