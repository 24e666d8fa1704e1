//! Recursive removal.
//!
//! Authorization is asked top-down (pre-order) while unlinking happens
//! bottom-up (post-order). A directory is only removed once every child is
//! gone, so a skipped or failed child leaves its ancestors in place.

use std::fs;
use std::path::{Path, PathBuf};

use crate::delegate::{FileManagerDelegate, ask, recover};
use crate::error::{EnumFsOperation, FsError, FsResult};
use crate::util::read_dir_sorted;

/// Remove the item at `path_abs`, reporting `path_reported` for a
/// non-directory root and absolute paths for a directory and its contents.
///
/// A missing item is still offered to `should_remove` before its failure is
/// handed to the recovery callback.
pub(crate) fn remove_item(
    path_abs: &Path,
    path_reported: &Path,
    delegate: Option<&dyn FileManagerDelegate>,
) -> FsResult<()> {
    tracing::debug!(target: "treekit_fs::remove", "remove {}", path_abs.display());

    let meta = match fs::symlink_metadata(path_abs) {
        Ok(v) => v,
        Err(e) => {
            if !ask(delegate, |d| d.should_remove(path_reported)) {
                return Ok(());
            }
            let err = FsError::from_io(e, EnumFsOperation::Write, path_reported);
            return handle_error(err, path_reported, delegate);
        }
    };

    if meta.is_dir() {
        remove_directory(path_abs, delegate).map(|_| ())
    } else {
        remove_leaf(path_abs, path_reported, &meta, delegate).map(|_| ())
    }
}

fn handle_error(
    err: FsError,
    path_reported: &Path,
    delegate: Option<&dyn FileManagerDelegate>,
) -> FsResult<()> {
    if !recover(delegate, |d| {
        d.should_proceed_after_remove_error(&err, path_reported)
    }) {
        return Err(err);
    }
    tracing::warn!(
        target: "treekit_fs::remove",
        "delegate recovered from {err}"
    );
    Ok(())
}

/// `Ok(true)` when the item is gone.
fn remove_leaf(
    path_abs: &Path,
    path_reported: &Path,
    meta: &fs::Metadata,
    delegate: Option<&dyn FileManagerDelegate>,
) -> FsResult<bool> {
    if !ask(delegate, |d| d.should_remove(path_reported)) {
        return Ok(false);
    }
    tracing::trace!(target: "treekit_fs::remove", "unlink {}", path_abs.display());
    match remove_non_directory(path_abs, meta) {
        Ok(()) => Ok(true),
        Err(e) => {
            let err = FsError::from_io(e, EnumFsOperation::Write, path_reported);
            handle_error(err, path_reported, delegate).map(|_| false)
        }
    }
}

fn remove_directory(
    path_dir: &Path,
    delegate: Option<&dyn FileManagerDelegate>,
) -> FsResult<bool> {
    if !ask(delegate, |d| d.should_remove(path_dir)) {
        return Ok(false);
    }

    let l_names = match read_dir_sorted(path_dir) {
        Ok(v) => v,
        Err(e) => {
            let err = FsError::from_io(e, EnumFsOperation::Read, path_dir);
            return handle_error(err, path_dir, delegate).map(|_| false);
        }
    };

    let mut b_all_removed = true;
    for name in l_names {
        let path_child: PathBuf = path_dir.join(&name);
        let b_removed = match fs::symlink_metadata(&path_child) {
            Ok(meta) if meta.is_dir() => remove_directory(&path_child, delegate)?,
            Ok(meta) => remove_leaf(&path_child, &path_child, &meta, delegate)?,
            Err(e) => {
                let err = FsError::from_io(e, EnumFsOperation::Read, &path_child);
                handle_error(err, &path_child, delegate)?;
                false
            }
        };
        b_all_removed &= b_removed;
    }

    if !b_all_removed {
        tracing::debug!(
            target: "treekit_fs::remove",
            "kept {} (not all children removed)",
            path_dir.display()
        );
        return Ok(false);
    }

    tracing::trace!(target: "treekit_fs::remove", "rmdir {}", path_dir.display());
    match fs::remove_dir(path_dir) {
        Ok(()) => Ok(true),
        Err(e) => {
            let err = FsError::from_io(e, EnumFsOperation::Write, path_dir);
            handle_error(err, path_dir, delegate).map(|_| false)
        }
    }
}

fn remove_non_directory(path: &Path, meta: &fs::Metadata) -> std::io::Result<()> {
    #[cfg(windows)]
    {
        if meta.file_type().is_symlink()
            && fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
        {
            return fs::remove_dir(path);
        }
    }
    #[cfg(not(windows))]
    let _ = meta;
    fs::remove_file(path)
}

/// Delegate-free removal used after a cross-device move.
pub(crate) fn remove_tree_quiet(path: &Path) -> FsResult<()> {
    let meta = fs::symlink_metadata(path)
        .map_err(|e| FsError::from_io(e, EnumFsOperation::Write, path))?;
    let res = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        remove_non_directory(path, &meta)
    };
    res.map_err(|e| FsError::from_io(e, EnumFsOperation::Write, path))
}
