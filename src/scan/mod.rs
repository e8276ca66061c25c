//! Concurrent workspace traversal producing a [`Snapshot`](crate::Snapshot).
//!
//! A fixed pool of scoped threads drains a self-feeding [`Worklist`] of
//! directories. Results land in one lock-guarded collector; once the pool is
//! done the paths are sorted and rendered as an indentation tree.

mod collector;
pub mod errors;
pub mod scanner;
pub mod tree;
pub mod worklist;

pub use errors::ScanError;
pub use scanner::{scan, ScanOptions, DEFAULT_WORKERS};
pub use tree::{compare_paths, render, sort_entries, TreeEntry};
pub use worklist::Worklist;
