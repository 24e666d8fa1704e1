//! Explicit working-directory state.
//!
//! Relative paths handed to the engine are resolved against a
//! [`FileContext`] instead of the process-wide current directory, so several
//! managers (and tests) can run side by side without stepping on each other.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{EnumFsOperation, FsError, FsResult};
use crate::path::standardize_lexically;

#[derive(Debug)]
pub struct FileContext {
    cwd: Mutex<PathBuf>,
}

impl FileContext {
    /// Context rooted at `cwd`. Relative inputs are resolved against the
    /// process directory once, here.
    pub fn new(cwd: impl AsRef<Path>) -> FsResult<Self> {
        let cwd = cwd.as_ref();
        let path_cwd = if cwd.is_absolute() {
            cwd.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| FsError::from_io(e, EnumFsOperation::Read, cwd))?
                .join(cwd)
        };
        Ok(Self {
            cwd: Mutex::new(standardize_lexically(&path_cwd)),
        })
    }

    /// Snapshot of the process directory at construction time.
    pub fn from_process() -> FsResult<Self> {
        let path_cwd = std::env::current_dir()
            .map_err(|e| FsError::from_io(e, EnumFsOperation::Read, "."))?;
        Ok(Self {
            cwd: Mutex::new(path_cwd),
        })
    }

    pub fn current_directory(&self) -> PathBuf {
        self.cwd.lock().clone()
    }

    /// Move the context to `path`. Returns `false` (and keeps the old value)
    /// unless `path` names an existing directory.
    pub fn change_current_directory(&self, path: impl AsRef<Path>) -> bool {
        let mut guard = self.cwd.lock();
        let path_target = standardize_lexically(&guard.join(path.as_ref()));
        match std::fs::metadata(&path_target) {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(
                    target: "treekit_fs::context",
                    "cwd {} -> {}",
                    guard.display(),
                    path_target.display()
                );
                *guard = path_target;
                true
            }
            _ => false,
        }
    }

    /// Absolute form of `path`; absolute inputs are returned unchanged.
    pub fn absolute(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.cwd.lock().join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::FileContext;

    #[test]
    fn change_directory_requires_existing_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(tmp.path().join("dir")).expect("mkdir");
        std::fs::write(tmp.path().join("dir/foo"), b"x").expect("write");

        let ctx = FileContext::new(tmp.path()).expect("context");
        assert!(ctx.change_current_directory("dir"));
        assert_eq!(ctx.current_directory(), tmp.path().join("dir"));
        assert!(!ctx.change_current_directory("foo"));
        assert!(!ctx.change_current_directory("does_not_exist"));
        assert!(ctx.change_current_directory(".."));
        assert_eq!(ctx.current_directory(), tmp.path());
    }

    #[test]
    fn absolute_joins_relative_paths_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = FileContext::new(tmp.path()).expect("context");
        assert_eq!(ctx.absolute("a/b"), tmp.path().join("a/b"));
        assert_eq!(ctx.absolute(tmp.path()), tmp.path());
    }
}
