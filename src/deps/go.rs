//! Go modules: `import` clauses, resolved with `go list`.

use super::errors::DepsError;
use super::Ecosystem;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

const LIST_FORMAT: &str = "{{.ImportPath}}\t{{.Dir}}";

#[derive(Debug, Default, Clone, Copy)]
pub struct GoModules;

fn block_regex() -> &'static Regex {
    static BLOCK: OnceLock<Regex> = OnceLock::new();
    BLOCK.get_or_init(|| Regex::new(r"(?ms)^\s*import\s*\((.*?)\)").expect("valid pattern"))
}

fn single_regex() -> &'static Regex {
    static SINGLE: OnceLock<Regex> = OnceLock::new();
    SINGLE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*import\s+(?:[A-Za-z_.][\w.]*\s+)?"([^"]+)""#).expect("valid pattern")
    })
}

fn quoted_regex() -> &'static Regex {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    QUOTED.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("valid pattern"))
}

impl Ecosystem for GoModules {
    fn name(&self) -> &'static str {
        "go"
    }

    fn source_extension(&self) -> &'static str {
        "go"
    }

    fn imports(&self, source: &str) -> Vec<String> {
        let mut imports = Vec::new();

        for block in block_regex().captures_iter(source) {
            for line in block[1].lines() {
                // Drop trailing comments before looking for the quoted path
                let line = line.split("//").next().unwrap_or("");
                if let Some(caps) = quoted_regex().captures(line) {
                    imports.push(caps[1].to_string());
                }
            }
        }
        for caps in single_regex().captures_iter(source) {
            imports.push(caps[1].to_string());
        }

        imports
    }

    fn locate(&self, root: &Path, imports: &[String]) -> Result<Vec<PathBuf>, DepsError> {
        let command = format!("go list -e -f {LIST_FORMAT:?}");
        let output = Command::new("go")
            .args(["list", "-e", "-f", LIST_FORMAT])
            .args(imports)
            .current_dir(root)
            .output()
            .map_err(|source| DepsError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DepsError::Toolchain {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_list_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Directories from `ImportPath<TAB>Dir` lines; unresolved imports have an
/// empty `Dir` and are dropped.
fn parse_list_output(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(_, dir)| dir.trim())
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .collect()
}
