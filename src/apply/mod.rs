//! Applying patch sets to a workspace.

pub mod backup;
pub mod errors;
pub mod orchestrator;

pub use backup::{BackupEntry, BackupManifest, LocalBackup};
pub use errors::{ApplyError, PartialApply, SkipReason};
pub use orchestrator::{
    apply_patch, plan_file, plan_patch, ApplyReport, NoVersioning, PatchTargets, Versioning,
};
