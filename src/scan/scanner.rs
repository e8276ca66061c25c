use super::collector::Collector;
use super::errors::ScanError;
use super::tree::{render, sort_entries, TreeEntry};
use super::worklist::Worklist;
use crate::deps::{self, EcosystemChoice};
use crate::ignore::IgnoreRules;
use crate::snapshot::{estimate_tokens, Snapshot};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

pub const DEFAULT_WORKERS: usize = 8;

/// Knobs for a single [`scan`] call.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub description: Option<String>,
    /// Relative paths to read. Empty means every non-ignored file.
    pub whitelist: Vec<String>,
    /// Token budget for file contents; `None` is unlimited.
    pub token_limit: Option<usize>,
    /// Add files from packages the whitelisted sources import.
    pub smart: bool,
    pub workers: usize,
    pub ecosystem: EcosystemChoice,
    /// Appended after the rules loaded from the root.
    pub extra_ignore: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            description: None,
            whitelist: Vec::new(),
            token_limit: None,
            smart: false,
            workers: DEFAULT_WORKERS,
            ecosystem: EcosystemChoice::Auto,
            extra_ignore: Vec::new(),
        }
    }
}

/// Walk `root` and build a [`Snapshot`] of its tree and eligible files.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<Snapshot, ScanError> {
    let meta = fs::metadata(root).map_err(|source| ScanError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ScanError::RootNotDirectory(root.to_path_buf()));
    }

    let mut rules = IgnoreRules::load(root);
    rules.extend(options.extra_ignore.iter());

    let eligible = eligible_set(root, options);
    if let Some(set) = &eligible {
        tracing::debug!(selected = set.len(), "whitelist active");
    }

    let walker = Walker {
        rules: &rules,
        eligible: eligible.as_ref(),
        collector: Collector::new(options.token_limit),
    };
    let list = Worklist::new([(root.to_path_buf(), String::new())]);

    thread::scope(|scope| {
        for _ in 0..options.workers.max(1) {
            scope.spawn(|| {
                while let Some(task) = list.next() {
                    let (dir, rel) = task.get();
                    walker.visit(dir, rel, &list);
                }
            });
        }
    });

    let mut collected = walker.collector.into_inner();
    sort_entries(&mut collected.entries);

    let tree = render(&root_label(root), &collected.entries);
    let dir_count = collected.entries.iter().filter(|e| e.is_dir).count();
    let token_count = collected.tokens + estimate_tokens(tree.len());

    tracing::info!(
        files = collected.files.len(),
        dirs = dir_count,
        tokens = token_count,
        over_budget = collected.over_budget,
        binary = collected.binary,
        "scan complete"
    );

    Ok(Snapshot {
        description: options.description.clone(),
        tree,
        file_count: collected.files.len(),
        files: collected.files,
        token_count,
        dir_count,
    })
}

/// `None` when every file is eligible.
fn eligible_set(root: &Path, options: &ScanOptions) -> Option<HashSet<String>> {
    if options.whitelist.is_empty() {
        return None;
    }

    let selected: Vec<String> = options
        .whitelist
        .iter()
        .filter_map(|p| normalize_rel(p))
        .collect();

    let mut set: HashSet<String> = selected.iter().cloned().collect();
    if options.smart {
        set.extend(deps::resolve_auto(root, &selected, options.ecosystem));
    }
    Some(set)
}

/// Normalize a user-supplied relative path to the collector's key form.
pub(crate) fn normalize_rel(path: &str) -> Option<String> {
    let path = path.trim().replace('\\', "/");
    let parts: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn root_label(root: &Path) -> String {
    let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    match canonical.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => ".".to_string(),
    }
}

struct Walker<'a> {
    rules: &'a IgnoreRules,
    eligible: Option<&'a HashSet<String>>,
    collector: Collector,
}

impl Walker<'_> {
    fn visit(&self, dir: &Path, dir_rel: &str, list: &Worklist<(PathBuf, String)>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(path = %dir.display(), "cannot list directory: {e}");
                return;
            }
        };

        for entry in entries {
            let Ok(entry) = entry else { continue };
            let name = entry.file_name().to_string_lossy().into_owned();
            let rel = if dir_rel.is_empty() {
                name
            } else {
                format!("{dir_rel}/{name}")
            };

            if self.rules.excludes(&rel) {
                tracing::debug!(path = %rel, "ignored");
                continue;
            }

            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_symlink() {
                // listed, never followed or read
                self.collector.record(TreeEntry::file(rel));
            } else if file_type.is_dir() {
                self.collector.record(TreeEntry::dir(rel.clone()));
                list.push((entry.path(), rel));
            } else if file_type.is_file() {
                self.collector.record(TreeEntry::file(rel.clone()));
                if self.is_eligible(&rel) {
                    self.read(&entry.path(), rel);
                }
            }
        }
    }

    fn is_eligible(&self, rel: &str) -> bool {
        self.eligible.map_or(true, |set| set.contains(rel))
    }

    fn read(&self, path: &Path, rel: String) {
        if let Ok(meta) = fs::metadata(path) {
            if !self.collector.fits(meta.len() as usize) {
                tracing::debug!(path = %rel, "over token budget");
                self.collector.skip_over_budget();
                return;
            }
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(path = %rel, "cannot read file: {e}");
                return;
            }
        };

        if bytes.contains(&0) {
            tracing::debug!(path = %rel, "binary file skipped");
            self.collector.record_binary();
            return;
        }

        let content = String::from_utf8_lossy(&bytes).into_owned();
        if !self.collector.offer(rel.clone(), content) {
            tracing::debug!(path = %rel, "over token budget");
        }
    }
}
