//! Indentation tree rendering for scanned paths.

use std::cmp::Ordering;

/// One collected path, `/`-separated and relative to the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub is_dir: bool,
}

impl TreeEntry {
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    fn depth(&self) -> usize {
        self.path.split('/').count()
    }

    fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Segment-wise ordering, so a directory's children directly follow it.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}

/// Sort entries into render order.
pub fn sort_entries(entries: &mut [TreeEntry]) {
    entries.sort_by(|a, b| compare_paths(&a.path, &b.path));
}

/// Render `entries` (already in [`sort_entries`] order) under `root_label`.
pub fn render(root_label: &str, entries: &[TreeEntry]) -> String {
    let depths: Vec<usize> = entries.iter().map(TreeEntry::depth).collect();

    // Walk backwards: an entry is last when no later sibling shares its parent.
    let mut is_last = vec![false; entries.len()];
    let mut sibling_after: Vec<bool> = Vec::new();
    for i in (0..entries.len()).rev() {
        let depth = depths[i];
        if sibling_after.len() <= depth {
            sibling_after.resize(depth + 1, false);
        }
        is_last[i] = !sibling_after[depth];
        sibling_after[depth] = true;
        for deeper in sibling_after.iter_mut().skip(depth + 1) {
            *deeper = false;
        }
    }

    let mut out = String::new();
    out.push_str(root_label);
    out.push_str("/\n");

    let mut ancestors_last: Vec<bool> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        ancestors_last.truncate(depths[i] - 1);
        for last in &ancestors_last {
            out.push_str(if *last { "    " } else { "│   " });
        }
        out.push_str(if is_last[i] { "└── " } else { "├── " });
        out.push_str(entry.name());
        if entry.is_dir {
            out.push('/');
        }
        out.push('\n');
        ancestors_last.push(is_last[i]);
    }

    out
}
