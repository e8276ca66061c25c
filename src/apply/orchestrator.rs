//! Patch application entry point.
//!
//! Each file is handled independently, in path order:
//! - targets outside the workspace, or excluded by its ignore rules, are
//!   skipped (never written);
//! - payloads with search/replace markers are applied hunk by hunk against
//!   the current file;
//! - blank payloads delete the file;
//! - anything else replaces the file verbatim.
//!
//! A failure stops the remaining files. Files already written stay written.

use super::errors::{ApplyError, PartialApply, SkipReason};
use crate::edit::{EditOutcome, FileEdit};
use crate::hunk;
use crate::ignore::IgnoreRules;
use crate::safety::{SafetyError, WorkspaceGuard};
use crate::snapshot::PatchSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Backup/versioning collaborator.
///
/// `backup` runs once before any file is touched; `mark_applied` runs once
/// after every file succeeded and never after a failure.
pub trait Versioning {
    fn backup(&mut self, root: &Path, patch: &PatchSet) -> Result<String, ApplyError>;
    fn mark_applied(&mut self, root: &Path, id: &str) -> Result<(), ApplyError>;
}

/// Versioning that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVersioning;

impl Versioning for NoVersioning {
    fn backup(&mut self, _root: &Path, _patch: &PatchSet) -> Result<String, ApplyError> {
        Ok(String::new())
    }

    fn mark_applied(&mut self, _root: &Path, _id: &str) -> Result<(), ApplyError> {
        Ok(())
    }
}

/// Per-path outcome of an apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Identifier returned by the versioning collaborator (empty for none)
    pub backup_id: String,
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub deleted: Vec<String>,
    /// Targets outside the workspace or excluded by its ignore rules
    pub skipped: Vec<String>,
}

impl ApplyReport {
    fn record(&mut self, path: &str, outcome: &EditOutcome) {
        let list = match outcome {
            EditOutcome::Written { .. } => &mut self.written,
            EditOutcome::Unchanged { .. } | EditOutcome::AlreadyAbsent { .. } => {
                &mut self.unchanged
            }
            EditOutcome::Deleted { .. } => &mut self.deleted,
        };
        list.push(path.to_string());
    }

    pub fn touched(&self) -> usize {
        self.written.len() + self.deleted.len()
    }
}

/// Which patch paths may be written, and where they land.
///
/// A target must resolve inside the workspace and must not be excluded by
/// the root's ignore rules (defaults plus `.gitignore` and `.ctxignore`).
/// The ignore files themselves stay writable.
#[derive(Debug, Clone)]
pub struct PatchTargets {
    guard: WorkspaceGuard,
    rules: IgnoreRules,
}

impl PatchTargets {
    pub fn new(root: &Path) -> Result<Self, ApplyError> {
        let guard = WorkspaceGuard::new(root).map_err(|_| ApplyError::Root(root.to_path_buf()))?;
        let rules = IgnoreRules::load(guard.workspace_root());
        Ok(Self { guard, rules })
    }

    pub fn workspace_root(&self) -> &Path {
        self.guard.workspace_root()
    }

    /// Absolute target and normalized `/`-separated key for `path`, or the
    /// reason it must not be touched.
    pub fn resolve(&self, path: &str) -> Result<(PathBuf, String), SkipReason> {
        let target = self.guard.resolve(path)?;
        let rel = self.guard.relative(&target).ok_or_else(|| SafetyError::OutsideWorkspace {
            path: target.clone(),
            workspace: self.workspace_root().to_path_buf(),
        })?;

        if self.rules.excludes(&rel) {
            return Err(SkipReason::Ignored(rel));
        }
        Ok((target, rel))
    }
}

/// Work out what applying `content` to `path` would do, without writing.
///
/// Returns `Ok(None)` when the target is outside the workspace or ignored.
pub fn plan_file(
    targets: &PatchTargets,
    path: &str,
    content: &str,
) -> Result<Option<FileEdit>, ApplyError> {
    let target = match targets.resolve(path) {
        Ok((target, _)) => target,
        Err(reason) => {
            tracing::warn!(path, %reason, "skipping patch target");
            return Ok(None);
        }
    };

    if hunk::is_surgical(content) {
        let current = fs::read_to_string(&target).map_err(|source| ApplyError::Read {
            path: path.to_string(),
            source,
        })?;

        let hunks = hunk::parse(content);
        if hunks.is_empty() {
            tracing::warn!(path, "surgical payload has no well-formed hunks");
        }

        let updated = hunk::apply_all(&current, &hunks).map_err(|source| ApplyError::Hunk {
            path: path.to_string(),
            source,
        })?;
        tracing::debug!(path, hunks = hunks.len(), "hunks matched");

        return Ok(Some(FileEdit::Write {
            path: target,
            before: Some(current),
            content: updated,
        }));
    }

    let before = fs::read_to_string(&target).ok();
    if content.trim().is_empty() {
        return Ok(Some(FileEdit::Delete {
            path: target,
            before,
        }));
    }

    Ok(Some(FileEdit::Write {
        path: target,
        before,
        content: content.to_string(),
    }))
}

/// Plan every file of a patch independently (dry run).
pub fn plan_patch(
    root: &Path,
    patch: &PatchSet,
) -> Result<Vec<(String, Result<Option<FileEdit>, ApplyError>)>, ApplyError> {
    let targets = PatchTargets::new(root)?;
    Ok(patch
        .files
        .iter()
        .map(|(path, content)| (path.clone(), plan_file(&targets, path, content)))
        .collect())
}

/// Apply a patch set to the workspace at `root`.
pub fn apply_patch(
    root: &Path,
    patch: &PatchSet,
    versioning: &mut dyn Versioning,
) -> Result<ApplyReport, PartialApply> {
    let mut report = ApplyReport::default();

    let targets = match PatchTargets::new(root) {
        Ok(targets) => targets,
        Err(error) => return Err(PartialApply { report, error }),
    };

    report.backup_id = match versioning.backup(targets.workspace_root(), patch) {
        Ok(id) => id,
        Err(error) => return Err(PartialApply { report, error }),
    };

    for (path, content) in &patch.files {
        let result = plan_file(&targets, path, content)
            .and_then(|edit| edit.map(|e| e.commit().map_err(ApplyError::from)).transpose());

        match result {
            Ok(Some(outcome)) => {
                tracing::debug!(path = %path, ?outcome, "file committed");
                report.record(path, &outcome);
            }
            Ok(None) => report.skipped.push(path.clone()),
            Err(error) => {
                tracing::warn!(path = %path, %error, "aborting patch");
                return Err(PartialApply { report, error });
            }
        }
    }

    if let Err(error) = versioning.mark_applied(targets.workspace_root(), &report.backup_id) {
        return Err(PartialApply { report, error });
    }

    tracing::info!(
        written = report.written.len(),
        deleted = report.deleted.len(),
        unchanged = report.unchanged.len(),
        skipped = report.skipped.len(),
        "patch applied"
    );
    Ok(report)
}
