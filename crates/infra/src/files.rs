//! Path guard for the upload directory.
//!
//! Any client-supplied relative path is resolved against a fixed root and
//! rejected unless the result stays inside that root. This runs before a file
//! is read or deleted and is independent of authentication.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileAccessError {
    #[error("path escapes the storage root: {0}")]
    OutsideRoot(String),

    #[error("path is empty")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct FileRoot {
    root: PathBuf,
}

impl FileRoot {
    /// `root` is made absolute (against the current directory) and lexically
    /// normalized once, here.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let absolute = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(root))
                .unwrap_or_else(|_| root.to_path_buf())
        };

        Self {
            root: normalize(&absolute),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` under the root, lexically.
    ///
    /// Absolute paths and any `..` that would climb above the root are
    /// rejected; the file itself need not exist.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, FileAccessError> {
        let trimmed = relative.trim();
        if trimmed.is_empty() {
            return Err(FileAccessError::Empty);
        }

        let candidate = normalize(&self.root.join(trimmed));
        if candidate == self.root || !candidate.starts_with(&self.root) {
            tracing::warn!(path = relative, "rejected path outside storage root");
            return Err(FileAccessError::OutsideRoot(relative.to_string()));
        }

        Ok(candidate)
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> FileRoot {
        FileRoot::new("/srv/uploads")
    }

    #[test]
    fn resolves_nested_paths() {
        let path = root().resolve("novels/6/cover/a.jpg").unwrap();
        assert_eq!(path, PathBuf::from("/srv/uploads/novels/6/cover/a.jpg"));
    }

    #[test]
    fn inner_dot_dot_is_fine_while_inside() {
        let path = root().resolve("pages/../novels/./b.png").unwrap();
        assert_eq!(path, PathBuf::from("/srv/uploads/novels/b.png"));
    }

    #[test]
    fn traversal_is_rejected() {
        assert!(matches!(root().resolve("../etc/passwd"), Err(FileAccessError::OutsideRoot(_))));
        assert!(matches!(
            root().resolve("pages/../../uploads-other/x"),
            Err(FileAccessError::OutsideRoot(_))
        ));
        assert!(matches!(root().resolve("/etc/passwd"), Err(FileAccessError::OutsideRoot(_))));
        assert!(matches!(root().resolve(".."), Err(FileAccessError::OutsideRoot(_))));
    }

    #[test]
    fn prefix_sibling_is_not_inside() {
        // "/srv/uploads2" starts with "/srv/uploads" as a string but not as a path.
        assert!(root().resolve("../uploads2/x").is_err());
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(root().resolve("  "), Err(FileAccessError::Empty));
    }
}
