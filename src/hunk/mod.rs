//! Search/replace hunks: parsing the block dialect and applying it.
//!
//! Application is sequential. Each hunk is matched against the text produced
//! by the hunks before it, so order in the payload matters.

pub mod applier;
pub mod errors;
pub mod parser;

pub use applier::{apply, apply_all, locate, Located, MatchKind};
pub use errors::{ClosestLine, HunkError};
pub use parser::{is_surgical, parse, Hunk, DIVIDER_MARKER, REPLACE_MARKER, SEARCH_MARKER};
