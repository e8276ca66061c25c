use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HunkError {
    #[error("hunk #{index} did not match{}", hint_suffix(.closest))]
    NoMatch {
        /// 1-based position of the failing hunk in the payload.
        index: usize,
        search: String,
        closest: Option<ClosestLine>,
    },
}

/// Most similar file line to the first line of an unmatched search block.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestLine {
    /// 1-based line number in the text the hunk was applied to.
    pub line: usize,
    pub text: String,
    pub similarity: f64,
}

fn hint_suffix(closest: &Option<ClosestLine>) -> String {
    match closest {
        Some(c) => format!(
            " (closest line {}: {:?}, {:.0}% similar)",
            c.line,
            c.text,
            c.similarity * 100.0
        ),
        None => String::new(),
    }
}
