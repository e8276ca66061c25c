//! Search/replace block parsing.
//!
//! ```text
//! <<<<<<< SEARCH
//! old lines
//! =======
//! new lines
//! >>>>>>> REPLACE
//! ```
//!
//! Blocks are concatenated in application order. Fragments that are missing a
//! marker, or whose search text is blank, are dropped.

pub const SEARCH_MARKER: &str = "<<<<<<< SEARCH";
pub const DIVIDER_MARKER: &str = "=======";
pub const REPLACE_MARKER: &str = ">>>>>>> REPLACE";

/// One search/replace unit of a surgical patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub search: String,
    pub replace: String,
}

impl Hunk {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
        }
    }

    /// Render back into the block dialect.
    pub fn to_block(&self) -> String {
        format!(
            "{SEARCH_MARKER}\n{}\n{DIVIDER_MARKER}\n{}\n{REPLACE_MARKER}\n",
            self.search, self.replace
        )
    }
}

/// True when a payload should be applied surgically rather than written.
pub fn is_surgical(payload: &str) -> bool {
    payload.contains(SEARCH_MARKER) && payload.contains(DIVIDER_MARKER)
}

/// Parse every well-formed block out of `payload`, in order.
pub fn parse(payload: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();

    for (position, fragment) in payload.split(REPLACE_MARKER).enumerate() {
        let Some(search_at) = fragment.find(SEARCH_MARKER) else {
            continue;
        };
        let body = &fragment[search_at + SEARCH_MARKER.len()..];

        // The divider must close the search block; one that only appears
        // before the search marker does not count.
        let Some(divider_at) = body.find(DIVIDER_MARKER) else {
            tracing::debug!(position, "dropping fragment without divider");
            continue;
        };

        let search = trim_blank_lines(&body[..divider_at]);
        let replace = trim_blank_lines(&body[divider_at + DIVIDER_MARKER.len()..]);

        if search.trim().is_empty() {
            tracing::debug!(position, "dropping fragment with blank search text");
            continue;
        }

        hunks.push(Hunk::new(search, replace));
    }

    hunks
}

/// Drop whitespace-only lines at both ends, keep everything in between
/// (including the indentation of the first kept line).
fn trim_blank_lines(text: &str) -> &str {
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }

    let rest = &text[start..];
    let mut end = rest.len();
    while end > 0 {
        let line_start = rest[..end].rfind('\n').map_or(0, |i| i + 1);
        if !rest[line_start..end].trim().is_empty() {
            break;
        }
        // Also drop the newline that ended the previous line.
        end = line_start.saturating_sub(1);
    }

    rest[..end].trim_end_matches('\r')
}
