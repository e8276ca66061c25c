use super::orchestrator::ApplyReport;
use crate::edit::EditError;
use crate::hunk::HunkError;
use crate::safety::SafetyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("cannot read {path} for surgical patch: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Hunk {
        path: String,
        #[source]
        source: HunkError,
    },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("workspace root {0} is not accessible")]
    Root(PathBuf),

    #[error("backup failed: {0}")]
    Backup(String),

    #[error("backup {0} not found")]
    UnknownBackup(String),
}

/// Why a patch target was left alone.
#[derive(Error, Debug)]
pub enum SkipReason {
    #[error(transparent)]
    Outside(#[from] SafetyError),

    #[error("{0} is excluded by ignore rules")]
    Ignored(String),
}

/// A patch that stopped partway. Files listed in `report` were already
/// written and stay written.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct PartialApply {
    pub report: ApplyReport,
    #[source]
    pub error: ApplyError,
}

impl ApplyError {
    /// The patch path this error is about, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ApplyError::Read { path, .. } | ApplyError::Hunk { path, .. } => Some(path),
            _ => None,
        }
    }
}
