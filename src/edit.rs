use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The file-system primitive every applied patch compiles down to.
///
/// Planning (hunk matching, containment) happens before a `FileEdit` exists;
/// committing only writes or removes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileEdit does nothing until commit() is called"]
pub enum FileEdit {
    /// Replace (or create) the file with `content`
    Write {
        path: PathBuf,
        /// Current content, if the file exists (for diffs and reporting)
        before: Option<String>,
        content: String,
    },
    /// Remove the file
    Delete {
        path: PathBuf,
        before: Option<String>,
    },
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a committed edit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Written { path: PathBuf, bytes: usize },
    Unchanged { path: PathBuf },
    Deleted { path: PathBuf },
    /// Deletion requested for a file that does not exist
    AlreadyAbsent { path: PathBuf },
}

impl FileEdit {
    pub fn path(&self) -> &Path {
        match self {
            FileEdit::Write { path, .. } | FileEdit::Delete { path, .. } => path,
        }
    }

    pub fn before(&self) -> Option<&str> {
        match self {
            FileEdit::Write { before, .. } | FileEdit::Delete { before, .. } => before.as_deref(),
        }
    }

    /// Content after the edit; `None` for deletions.
    pub fn after(&self) -> Option<&str> {
        match self {
            FileEdit::Write { content, .. } => Some(content),
            FileEdit::Delete { .. } => None,
        }
    }

    /// True when committing would leave the file system as it is.
    pub fn is_noop(&self) -> bool {
        match self {
            FileEdit::Write {
                before, content, ..
            } => before.as_deref() == Some(content.as_str()),
            FileEdit::Delete { before, .. } => before.is_none(),
        }
    }

    /// Apply to disk. Writes are atomic (tempfile + fsync + rename) and create
    /// missing parent directories.
    pub fn commit(&self) -> Result<EditOutcome, EditError> {
        match self {
            FileEdit::Write { path, content, .. } => {
                if self.is_noop() {
                    return Ok(EditOutcome::Unchanged { path: path.clone() });
                }
                atomic_write(path, content.as_bytes()).map_err(|source| EditError::Write {
                    path: path.clone(),
                    source,
                })?;
                Ok(EditOutcome::Written {
                    path: path.clone(),
                    bytes: content.len(),
                })
            }
            FileEdit::Delete { path, .. } => match fs::remove_file(path) {
                Ok(()) => Ok(EditOutcome::Deleted { path: path.clone() }),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    Ok(EditOutcome::AlreadyAbsent { path: path.clone() })
                }
                Err(source) => Err(EditError::Remove {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the previous content stays in place.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "Path has no parent directory")
    })?;
    fs::create_dir_all(parent)?;

    // Same directory keeps the rename on one filesystem
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("a/b/c.txt");

        let edit = FileEdit::Write {
            path: path.clone(),
            before: None,
            content: "hello\n".to_string(),
        };
        let outcome = edit.commit().unwrap();

        assert_eq!(outcome, EditOutcome::Written { path: path.clone(), bytes: 6 });
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_write_overwrites_existing_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("file.txt");
        fs::write(&path, "original content").unwrap();

        let edit = FileEdit::Write {
            path: path.clone(),
            before: Some("original content".to_string()),
            content: "modified content".to_string(),
        };
        assert!(!edit.is_noop());
        edit.commit().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "modified content");
    }

    #[test]
    fn test_identical_write_is_unchanged() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("same.txt");
        fs::write(&path, "same").unwrap();

        let edit = FileEdit::Write {
            path: path.clone(),
            before: Some("same".to_string()),
            content: "same".to_string(),
        };
        assert!(edit.is_noop());
        assert!(matches!(edit.commit().unwrap(), EditOutcome::Unchanged { .. }));
    }

    #[test]
    fn test_delete_existing_and_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gone.txt");
        fs::write(&path, "bye").unwrap();

        let edit = FileEdit::Delete {
            path: path.clone(),
            before: Some("bye".to_string()),
        };
        assert!(matches!(edit.commit().unwrap(), EditOutcome::Deleted { .. }));
        assert!(!path.exists());

        assert!(matches!(
            edit.commit().unwrap(),
            EditOutcome::AlreadyAbsent { .. }
        ));
    }
}
