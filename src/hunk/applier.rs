//! Hunk application: exact match first, then a trimmed line-wise match that
//! tolerates indentation drift.

use super::errors::{ClosestLine, HunkError};
use super::parser::Hunk;
use std::ops::Range;

/// Below this similarity a closest-line hint is not worth reporting.
const MIN_HINT_SIMILARITY: f64 = 0.5;

/// How a hunk was located in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    /// Matched line-by-line after trimming; holds the 1-based first line.
    Fuzzy { line: usize },
}

/// Byte span a hunk's search text occupies in a given text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub span: Range<usize>,
    pub kind: MatchKind,
}

/// Find where `hunk` applies in `text` without modifying anything.
pub fn locate(text: &str, hunk: &Hunk) -> Option<Located> {
    if hunk.search.trim().is_empty() {
        return None;
    }

    if let Some(start) = text.find(&hunk.search) {
        return Some(Located {
            span: start..start + hunk.search.len(),
            kind: MatchKind::Exact,
        });
    }

    locate_fuzzy(text, &hunk.search)
}

/// Apply one hunk to the first match in `text`.
///
/// Returns the original text and `false` when neither strategy matches.
pub fn apply(text: &str, hunk: &Hunk) -> (String, bool) {
    match locate(text, hunk) {
        Some(located) => {
            let mut updated = String::with_capacity(text.len() + hunk.replace.len());
            updated.push_str(&text[..located.span.start]);
            updated.push_str(&hunk.replace);
            updated.push_str(&text[located.span.end..]);
            (updated, true)
        }
        None => (text.to_string(), false),
    }
}

/// Apply hunks one after another, each against the output of the previous.
pub fn apply_all(text: &str, hunks: &[Hunk]) -> Result<String, HunkError> {
    let mut current = text.to_string();

    for (i, hunk) in hunks.iter().enumerate() {
        let (updated, matched) = apply(&current, hunk);
        if !matched {
            return Err(HunkError::NoMatch {
                index: i + 1,
                search: hunk.search.clone(),
                closest: closest_line(&current, &hunk.search),
            });
        }
        current = updated;
    }

    Ok(current)
}

/// Line spans of `text`, excluding the terminating `\n` / `\r\n`.
fn line_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches('\n').trim_end_matches('\r');
        spans.push(start..start + content.len());
        start += line.len();
    }
    spans
}

fn locate_fuzzy(text: &str, search: &str) -> Option<Located> {
    let wanted: Vec<&str> = search.lines().map(str::trim).collect();
    if wanted.is_empty() {
        return None;
    }

    let spans = line_spans(text);
    if spans.len() < wanted.len() {
        return None;
    }

    for first in 0..=spans.len() - wanted.len() {
        let window = &spans[first..first + wanted.len()];
        let hit = window
            .iter()
            .zip(&wanted)
            .all(|(span, want)| text[span.clone()].trim() == *want);

        if hit {
            let start = window[0].start;
            let end = window[window.len() - 1].end;
            return Some(Located {
                span: start..end,
                kind: MatchKind::Fuzzy { line: first + 1 },
            });
        }
    }

    None
}

fn closest_line(text: &str, search: &str) -> Option<ClosestLine> {
    let needle = search.lines().map(str::trim).find(|l| !l.is_empty())?;

    text.lines()
        .enumerate()
        .map(|(i, line)| {
            let score = strsim::normalized_levenshtein(line.trim(), needle);
            (i, line, score)
        })
        .filter(|(_, _, score)| *score >= MIN_HINT_SIMILARITY)
        .max_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(i, line, score)| ClosestLine {
            line: i + 1,
            text: line.trim().to_string(),
            similarity: score,
        })
}
