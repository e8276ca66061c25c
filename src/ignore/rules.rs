use globset::{Glob, GlobMatcher};
use std::fs;
use std::io;
use std::path::Path;

/// Rules every scan starts from: version control, the local backup
/// directory, build output and native executables.
pub const DEFAULT_RULES: &[&str] = &[
    ".git/", ".ctxsnap/", "target/", "dist/", "*.exe", "*.dll", "*.so", "*.dylib",
];

/// Ignore files read from the workspace root, in load order.
pub const IGNORE_FILES: &[&str] = &[".gitignore", ".ctxignore"];

/// A single exclusion rule.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    raw: String,
    kind: RuleKind,
}

#[derive(Debug, Clone)]
enum RuleKind {
    /// `name/` - matches when any path segment equals `name`.
    Segment(String),
    /// No separator - glob against the basename.
    Basename(Option<GlobMatcher>),
    /// Contains a separator - only the prefix check applies.
    Prefix,
}

impl IgnoreRule {
    /// Parse a rule line. Returns `None` for blanks, comments and negations.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            return None;
        }

        // Anchored gitignore rules ("/build") are plain prefixes here.
        let raw = line.strip_prefix('/').unwrap_or(line);
        if raw.is_empty() {
            return None;
        }

        let kind = if let Some(dir) = raw.strip_suffix('/') {
            RuleKind::Segment(dir.to_string())
        } else if !raw.contains('/') {
            RuleKind::Basename(Glob::new(raw).ok().map(|g| g.compile_matcher()))
        } else {
            RuleKind::Prefix
        };

        Some(Self {
            raw: raw.to_string(),
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check a `/`-separated relative path against this rule.
    pub fn matches(&self, rel_path: &str) -> bool {
        let hit = match &self.kind {
            RuleKind::Segment(dir) => rel_path.split('/').any(|segment| segment == dir),
            RuleKind::Basename(matcher) => {
                let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
                match matcher {
                    Some(matcher) => matcher.is_match(name),
                    None => name == self.raw,
                }
            }
            RuleKind::Prefix => false,
        };

        hit || rel_path.starts_with(&self.raw)
    }
}

/// Ordered rule list; a path is ignored when any rule matches.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// Built-in defaults followed by `.gitignore` and `.ctxignore` at `root`.
    ///
    /// Missing files are not an error. A file that exists but cannot be read
    /// is logged and skipped.
    pub fn load(root: &Path) -> Self {
        let mut rules = Self::from_patterns(DEFAULT_RULES.iter().copied());

        for name in IGNORE_FILES {
            let path = root.join(name);
            match fs::read_to_string(&path) {
                Ok(contents) => {
                    let before = rules.len();
                    rules.extend(contents.lines());
                    tracing::debug!(
                        file = %path.display(),
                        added = rules.len() - before,
                        "loaded ignore rules"
                    );
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to read ignore file {}: {}", path.display(), e);
                }
            }
        }

        rules
    }

    /// Build a rule list from patterns, without the defaults.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Self::default();
        rules.extend(patterns);
        rules
    }

    /// Append rules, skipping blanks and comments.
    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rules.extend(
            patterns
                .into_iter()
                .filter_map(|line| IgnoreRule::parse(line.as_ref())),
        );
    }

    /// First matching rule wins.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(rel_path))
    }

    /// Like [`matches`](Self::matches) but the ignore files themselves are
    /// never excluded, so they stay visible and editable.
    pub fn excludes(&self, rel_path: &str) -> bool {
        !is_pinned(rel_path) && self.matches(rel_path)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IgnoreRule> {
        self.rules.iter()
    }
}

/// The root-level ignore files are force-included regardless of rules.
pub fn is_pinned(rel_path: &str) -> bool {
    IGNORE_FILES.contains(&rel_path)
}
