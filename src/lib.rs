//! ctxsnap: workspace snapshots for coding agents, and a patch engine to
//! apply their edits back.
//!
//! # Architecture
//!
//! Two pipelines share one data model ([`FileMap`]):
//!
//! - **scan**: a worker pool walks the workspace, applies ignore rules, reads
//!   eligible files within a token budget and renders an indentation tree
//!   into a [`Snapshot`]. Smart mode adds files from packages the selected
//!   sources import.
//! - **apply**: an agent response is decoded ([`decode_response`]) into a
//!   [`PatchSet`]. Each file's payload is a full replacement, a sequence of
//!   search/replace hunks, or a blank deletion signal.
//!
//! # Safety
//!
//! - Every write target is resolved inside the workspace root, symlinks
//!   included; anything else is skipped
//! - Atomic file writes (tempfile + fsync + rename)
//! - Hunks fall back to whitespace-insensitive line matching, never to
//!   guessing
//!
//! # Example
//!
//! ```no_run
//! use ctxsnap::{apply_patch, decode_response, scan, NoVersioning, ScanOptions};
//! use std::path::Path;
//!
//! let root = Path::new(".");
//! let snapshot = scan(root, &ScanOptions::default()).unwrap();
//! println!("{}", snapshot.to_json().unwrap());
//!
//! let response = "\"src/lib.rs\":\n<<<<<<< SEARCH\nold\n=======\nnew\n>>>>>>> REPLACE\n";
//! if let Some(patch) = decode_response(response) {
//!     match apply_patch(root, &patch, &mut NoVersioning) {
//!         Ok(report) => println!("{} files written", report.written.len()),
//!         Err(e) => eprintln!("apply failed: {e}"),
//!     }
//! }
//! ```

pub mod apply;
pub mod config;
pub mod deps;
pub mod dialect;
pub mod edit;
pub mod hunk;
pub mod ignore;
pub mod safety;
pub mod scan;
pub mod snapshot;

// Re-exports
pub use apply::{
    apply_patch, plan_file, plan_patch, ApplyError, ApplyReport, LocalBackup, NoVersioning,
    PartialApply, PatchTargets, Versioning,
};
pub use config::{load_settings, ConfigError, Settings};
pub use deps::{resolve, resolve_auto, DepsError, Ecosystem, EcosystemChoice};
pub use dialect::{decode_response, parse_native};
pub use edit::{EditError, EditOutcome, FileEdit};
pub use hunk::{Hunk, HunkError};
pub use ignore::{IgnoreRule, IgnoreRules};
pub use safety::{SafetyError, WorkspaceGuard};
pub use scan::{scan, ScanError, ScanOptions};
pub use snapshot::{estimate_tokens, FileMap, PatchSet, Snapshot};
