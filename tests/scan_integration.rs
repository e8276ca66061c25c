//! Integration tests for workspace scanning
//!
//! Builds real directory trees in temp dirs and checks the snapshot's tree,
//! file map, budget accounting and ignore handling.

use ctxsnap::{estimate_tokens, scan, IgnoreRules, ScanOptions};
use proptest::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small Go-style project with some noise that should be ignored.
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "go.mod", "module example.com/app\n\ngo 1.22\n");
    write(root, "cmd/app/main.go", "package main\n\nfunc main() {}\n");
    write(root, "internal/db/db.go", "package db\n");
    write(root, "README.md", "# app\n");
    write(root, ".git/config", "[core]\n");
    write(root, "node_modules/left-pad/index.js", "module.exports = 1;\n");
    write(root, "build/app.exe", "MZ");
    write(root, ".gitignore", "node_modules/\nbuild/\n");

    dir
}

#[test]
fn test_scan_full_project() {
    let project = setup_project();
    let snapshot = scan(project.path(), &ScanOptions::default()).unwrap();

    let keys: Vec<&str> = snapshot.files.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            ".gitignore",
            "README.md",
            "cmd/app/main.go",
            "go.mod",
            "internal/db/db.go"
        ]
    );
    assert_eq!(snapshot.file_count, 5);
    assert_eq!(snapshot.dir_count, 4);

    let label = project
        .path()
        .canonicalize()
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    let expected_tree = format!(
        "{label}/
├── .gitignore
├── README.md
├── cmd/
│   └── app/
│       └── main.go
├── go.mod
└── internal/
    └── db/
        └── db.go
"
    );
    assert_eq!(snapshot.tree, expected_tree);

    let content_tokens: usize = snapshot.files.values().map(|c| estimate_tokens(c.len())).sum();
    assert_eq!(
        snapshot.token_count,
        content_tokens + estimate_tokens(snapshot.tree.len())
    );
}

#[test]
fn test_snapshot_json_wire_names() {
    let project = setup_project();
    let options = ScanOptions {
        description: Some("login bug".to_string()),
        ..ScanOptions::default()
    };
    let snapshot = scan(project.path(), &options).unwrap();

    let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(value["short_description"], "login bug");
    assert!(value["project_tree"].as_str().unwrap().contains("main.go"));
    assert_eq!(value["files"]["go.mod"], "module example.com/app\n\ngo 1.22\n");
    assert_eq!(value["file_count"], 5);
    assert!(value.get("tree").is_none());
}

#[test]
fn test_whitelist_reads_only_selected_files() {
    let project = setup_project();
    let options = ScanOptions {
        whitelist: vec!["./cmd/app/main.go".to_string(), "missing.go".to_string()],
        ..ScanOptions::default()
    };
    let snapshot = scan(project.path(), &options).unwrap();

    assert_eq!(snapshot.files.len(), 1);
    assert!(snapshot.files.contains_key("cmd/app/main.go"));
    // the tree still shows everything that is not ignored
    assert!(snapshot.tree.contains("── db.go\n"));
    assert!(snapshot.tree.contains("── README.md\n"));
}

#[test]
fn test_smart_without_ecosystem_adds_nothing() {
    let project = setup_project();
    let options = ScanOptions {
        whitelist: vec!["cmd/app/main.go".to_string()],
        smart: true,
        ecosystem: ctxsnap::EcosystemChoice::None,
        ..ScanOptions::default()
    };
    let snapshot = scan(project.path(), &options).unwrap();
    assert_eq!(snapshot.files.len(), 1);
}

#[test]
fn test_token_budget_caps_contents_not_tree() {
    let dir = TempDir::new().unwrap();
    for i in 0..10 {
        write(dir.path(), &format!("f{i}.txt"), &"x".repeat(400));
    }

    let options = ScanOptions {
        token_limit: Some(350),
        ..ScanOptions::default()
    };
    let snapshot = scan(dir.path(), &options).unwrap();

    // 100 tokens per file, so exactly three fit whichever worker gets there
    assert_eq!(snapshot.files.len(), 3);
    for i in 0..10 {
        assert!(snapshot.tree.contains(&format!("── f{i}.txt\n")));
    }
}

#[test]
fn test_zero_budget_reads_only_empty_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "empty.txt", "");
    write(dir.path(), "full.txt", "some text that costs tokens\n");

    let options = ScanOptions {
        token_limit: Some(0),
        ..ScanOptions::default()
    };
    let snapshot = scan(dir.path(), &options).unwrap();
    assert_eq!(snapshot.files.keys().collect::<Vec<_>>(), vec!["empty.txt"]);
}

#[test]
fn test_ignore_files_stay_visible() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".ctxignore", ".*\n");
    write(dir.path(), ".gitignore", "*.log\n");
    write(dir.path(), ".env", "SECRET=1\n");
    write(dir.path(), "debug.log", "noise\n");
    write(dir.path(), "main.rs", "fn main() {}\n");

    let snapshot = scan(dir.path(), &ScanOptions::default()).unwrap();
    let keys: Vec<&str> = snapshot.files.keys().map(String::as_str).collect();
    assert_eq!(keys, vec![".ctxignore", ".gitignore", "main.rs"]);
    assert!(!snapshot.tree.contains(".env"));
}

#[test]
fn test_extra_ignore_patterns() {
    let project = setup_project();
    let options = ScanOptions {
        extra_ignore: vec!["*.md".to_string(), "internal/".to_string()],
        ..ScanOptions::default()
    };
    let snapshot = scan(project.path(), &options).unwrap();

    assert!(!snapshot.files.contains_key("README.md"));
    assert!(!snapshot.tree.contains("internal"));
    assert!(snapshot.files.contains_key("go.mod"));
}

#[test]
fn test_backup_directory_is_never_scanned() {
    let project = setup_project();
    write(
        project.path(),
        ".ctxsnap/backups/20240101T000000.000Z-deadbeef/manifest.json",
        "{}",
    );

    let snapshot = scan(project.path(), &ScanOptions::default()).unwrap();
    assert!(!snapshot.tree.contains(".ctxsnap"));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_a_leaf() {
    let outside = TempDir::new().unwrap();
    write(outside.path(), "secret.txt", "do not read\n");

    let dir = TempDir::new().unwrap();
    write(dir.path(), "real/file.txt", "ok\n");
    std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();

    let snapshot = scan(dir.path(), &ScanOptions::default()).unwrap();
    assert!(snapshot.tree.contains("── linked\n"));
    assert!(!snapshot.tree.contains("secret.txt"));
    assert_eq!(snapshot.files.keys().collect::<Vec<_>>(), vec!["real/file.txt"]);
}

#[test]
fn test_large_tree_with_many_workers() {
    let dir = TempDir::new().unwrap();
    for a in 0..6 {
        for b in 0..6 {
            write(dir.path(), &format!("a{a}/b{b}/leaf.txt"), "leaf\n");
        }
    }

    let options = ScanOptions {
        workers: 3,
        ..ScanOptions::default()
    };
    let snapshot = scan(dir.path(), &options).unwrap();
    assert_eq!(snapshot.file_count, 36);
    assert_eq!(snapshot.dir_count, 42);
}

const DIRS: [&str; 4] = ["src", "node_modules", "dist/bin", "docs"];
const EXTS: [&str; 3] = ["rs", "exe", "txt"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_files_are_tree_leaves_and_never_ignored(
        layout in prop::collection::vec((0usize..DIRS.len(), 0usize..EXTS.len()), 1..14)
    ) {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".ctxignore", "node_modules/\n*.exe\ndist/bin\n");

        let mut created = Vec::new();
        for (i, (d, e)) in layout.iter().enumerate() {
            let name = format!("f{i}.{}", EXTS[*e]);
            let rel = format!("{}/{name}", DIRS[*d]);
            write(dir.path(), &rel, "content\n");
            created.push((rel, name));
        }

        let snapshot = scan(dir.path(), &ScanOptions::default()).unwrap();
        let rules = IgnoreRules::load(dir.path());

        for key in snapshot.files.keys() {
            prop_assert!(!rules.excludes(key));
            let name = key.rsplit('/').next().unwrap();
            let leaf = format!("── {name}\n");
            prop_assert!(snapshot.tree.contains(&leaf));
        }

        for (rel, name) in &created {
            let leaf = format!("── {name}\n");
            if rules.matches(rel) {
                prop_assert!(!snapshot.files.contains_key(rel));
                prop_assert!(!snapshot.tree.contains(&leaf));
            } else {
                prop_assert!(snapshot.files.contains_key(rel));
            }
        }
    }
}
