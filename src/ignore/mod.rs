//! Path exclusion rules shared by scanning and patch targeting.
//!
//! Rules come from a built-in default list plus `.gitignore` and `.ctxignore`
//! at the workspace root. Matching is deliberately permissive: a rule is
//! checked as a directory segment, a basename glob and a path prefix.

pub mod rules;

pub use rules::{is_pinned, IgnoreRule, IgnoreRules, DEFAULT_RULES, IGNORE_FILES};
