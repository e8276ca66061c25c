//! Cargo workspaces: `use` / `extern crate` roots, resolved against the
//! workspace's own packages via `cargo metadata --no-deps`.

use super::errors::DepsError;
use super::Ecosystem;
use cargo_metadata::MetadataCommand;
use std::path::{Path, PathBuf};
use syn::{Item, UseTree};

/// Path roots that never name another package.
const LOCAL_ROOTS: &[&str] = &["crate", "self", "super", "std", "core", "alloc"];

#[derive(Debug, Default, Clone, Copy)]
pub struct CargoWorkspace;

impl Ecosystem for CargoWorkspace {
    fn name(&self) -> &'static str {
        "cargo"
    }

    fn source_extension(&self) -> &'static str {
        "rs"
    }

    fn imports(&self, source: &str) -> Vec<String> {
        let file = match syn::parse_file(source) {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!("skipping unparsable Rust source: {e}");
                return Vec::new();
            }
        };

        let mut roots = Vec::new();
        collect_items(&file.items, &mut roots);
        roots.retain(|root| !LOCAL_ROOTS.contains(&root.as_str()));
        roots.sort();
        roots.dedup();
        roots
    }

    fn locate(&self, root: &Path, imports: &[String]) -> Result<Vec<PathBuf>, DepsError> {
        let metadata = MetadataCommand::new()
            .manifest_path(root.join("Cargo.toml"))
            .no_deps()
            .exec()?;

        let mut dirs = Vec::new();
        for package in &metadata.packages {
            let Some(lib) = package
                .targets
                .iter()
                .find(|t| t.kind.iter().any(|k| k == "lib" || k == "proc-macro"))
            else {
                continue;
            };

            let crate_name = lib.name.replace('-', "_");
            if !imports.iter().any(|import| *import == crate_name) {
                continue;
            }
            if let Some(dir) = lib.src_path.parent() {
                dirs.push(dir.as_std_path().to_path_buf());
            }
        }

        Ok(dirs)
    }
}

fn collect_items(items: &[Item], roots: &mut Vec<String>) {
    for item in items {
        match item {
            Item::Use(item_use) => collect_use_roots(&item_use.tree, roots),
            Item::ExternCrate(extern_crate) => roots.push(extern_crate.ident.to_string()),
            Item::Mod(module) => {
                if let Some((_, inner)) = &module.content {
                    collect_items(inner, roots);
                }
            }
            _ => {}
        }
    }
}

fn collect_use_roots(tree: &UseTree, roots: &mut Vec<String>) {
    match tree {
        UseTree::Path(path) => roots.push(path.ident.to_string()),
        UseTree::Name(name) => roots.push(name.ident.to_string()),
        UseTree::Rename(rename) => roots.push(rename.ident.to_string()),
        UseTree::Group(group) => {
            for item in &group.items {
                collect_use_roots(item, roots);
            }
        }
        UseTree::Glob(_) => {}
    }
}
