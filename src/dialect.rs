//! Native (non-JSON) response dialect and response decoding.
//!
//! The dialect is a sequence of quoted path headers, each followed by the
//! file's payload:
//!
//! ```text
//! "src/main.go":
//! <<<<<<< SEARCH
//! fmt.Println("hi")
//! =======
//! fmt.Println("hello")
//! >>>>>>> REPLACE
//! "README.md":
//! # Full replacement content
//! "old.txt":
//! ```
//!
//! A block with search/replace markers is surgical, a blank block is a
//! deletion signal and anything else is the file's full new content.

use crate::hunk::is_surgical;
use crate::snapshot::{FileMap, PatchSet};
use regex::Regex;
use std::sync::OnceLock;

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r#"(?m)^"([^"\r\n]+)":[ \t]*\r?$"#).expect("header pattern is valid")
    })
}

fn fenced_json_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n[ \t]*```")
            .expect("fence pattern is valid")
    })
}

/// Parse the quoted-header dialect. `None` when no header is present.
pub fn parse_native(text: &str) -> Option<PatchSet> {
    let headers: Vec<_> = header_regex().captures_iter(text).collect();
    if headers.is_empty() {
        return None;
    }

    let mut files = FileMap::new();
    for (i, caps) in headers.iter().enumerate() {
        let Some(whole) = caps.get(0) else { continue };
        let path = caps[1].to_string();

        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let block = &text[whole.end()..end];

        let payload = if is_surgical(block) {
            block.to_string()
        } else if block.trim().is_empty() {
            String::new()
        } else {
            full_content(&path, block)
        };

        if files.insert(path.clone(), payload).is_some() {
            tracing::warn!(path = %path, "duplicate header, keeping the last block");
        }
    }

    let description = match files.keys().next() {
        Some(path) if files.len() == 1 => format!("Update to {path}"),
        _ => format!("Updates to {} files", files.len()),
    };

    Some(PatchSet::new(Some(description), files))
}

/// Decode an agent response: JSON first, then the native dialect.
///
/// JSON is tried on the whole text, on the body of a fenced code block, and
/// on the outermost brace span. A JSON candidate only counts when it names
/// at least one file.
pub fn decode_response(text: &str) -> Option<PatchSet> {
    let trimmed = text.trim();

    let mut candidates = vec![trimmed];
    if let Some(caps) = fenced_json_regex().captures(trimmed) {
        candidates.push(caps.get(1).map_or("", |m| m.as_str()));
    }
    if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if open < close {
            candidates.push(&trimmed[open..=close]);
        }
    }

    for candidate in candidates {
        if let Ok(patch) = PatchSet::from_json(candidate) {
            if !patch.is_empty() {
                tracing::debug!(files = patch.len(), "decoded JSON patch set");
                return Some(patch);
            }
        }
    }

    let patch = parse_native(text);
    if let Some(patch) = &patch {
        tracing::debug!(files = patch.len(), "decoded native patch set");
    }
    patch
}

/// Full-content block: drop the header's line break, unwrap a surrounding
/// code fence, trim trailing blank lines and end with one newline.
///
/// Fence unwrapping is lossy for a file whose real content starts and ends
/// with a fence line, so it is skipped for markdown targets and for blocks
/// with another fence inside. Any other file that genuinely begins with
/// a fence line and ends with a bare one loses them.
fn full_content(path: &str, block: &str) -> String {
    let body = block
        .strip_prefix("\r\n")
        .or_else(|| block.strip_prefix('\n'))
        .unwrap_or(block);
    let body = trim_trailing_blank_lines(body);
    let body = if is_markdown(path) {
        body
    } else {
        unwrap_fence(body).unwrap_or(body)
    };

    let mut content = body.to_string();
    content.push('\n');
    content
}

fn trim_trailing_blank_lines(text: &str) -> &str {
    let mut end = text.len();
    loop {
        let trimmed = text[..end].trim_end_matches(['\n', '\r']);
        let line_start = trimmed.rfind('\n').map_or(0, |i| i + 1);
        if trimmed.len() > line_start && !trimmed[line_start..].trim().is_empty() {
            return trimmed;
        }
        if line_start == 0 {
            return "";
        }
        end = line_start;
    }
}

fn is_markdown(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
    [".md", ".markdown", ".mdx"]
        .iter()
        .any(|ext| name.ends_with(ext))
}

/// Body of a block wrapped in one fence whose info string is empty or a
/// bare language tag (```` ``` ````, ```` ```go ````, ```` ```c++ ````).
fn unwrap_fence(body: &str) -> Option<&str> {
    let first_break = body.find('\n')?;
    let opening = body[..first_break].trim();
    let last_break = body.rfind('\n')?;
    let closing = body[last_break + 1..].trim();

    let info = opening.strip_prefix("```")?;
    let is_tag = info
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '#' | '.' | '_'));
    if !is_tag || closing != "```" || first_break >= last_break {
        return None;
    }

    let inner = &body[first_break + 1..last_break];
    if inner.lines().any(|line| line.trim_start().starts_with("```")) {
        return None;
    }
    Some(inner.trim_end_matches('\r'))
}
