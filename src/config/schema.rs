use crate::deps::EcosystemChoice;
use crate::scan::{ScanOptions, DEFAULT_WORKERS};
use serde::Deserialize;
use std::fmt;

pub const MAX_WORKERS: usize = 64;

/// Per-workspace defaults read from `.ctxsnap.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `0` is treated the same as absent: unlimited.
    pub token_limit: Option<usize>,
    pub workers: usize,
    pub smart: bool,
    pub ecosystem: EcosystemChoice,
    pub backups: bool,
    pub ignore: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token_limit: None,
            workers: DEFAULT_WORKERS,
            smart: false,
            ecosystem: EcosystemChoice::Auto,
            backups: true,
            ignore: Vec::new(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if !(1..=MAX_WORKERS).contains(&self.workers) {
            issues.push(ValidationIssue::OutOfRange {
                field: "workers",
                value: self.workers,
                min: 1,
                max: MAX_WORKERS,
            });
        }

        for (index, rule) in self.ignore.iter().enumerate() {
            if rule.trim().is_empty() {
                issues.push(ValidationIssue::BlankEntry {
                    field: "ignore",
                    index,
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn token_limit(&self) -> Option<usize> {
        self.token_limit.filter(|limit| *limit > 0)
    }

    /// Scan options seeded from these settings; callers layer flags on top.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            token_limit: self.token_limit(),
            smart: self.smart,
            workers: self.workers,
            ecosystem: self.ecosystem,
            extra_ignore: self.ignore.clone(),
            ..ScanOptions::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    OutOfRange {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
    BlankEntry {
        field: &'static str,
        index: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "'{field}' must be between {min} and {max}, got {value}"),
            ValidationIssue::BlankEntry { field, index } => {
                write!(f, "'{field}' entry {index} is blank")
            }
        }
    }
}
