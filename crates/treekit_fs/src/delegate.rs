//! Per-item authorization and recovery hooks for recursive operations.

use std::path::Path;

use crate::error::FsError;

/// Policy consulted by [`crate::FileManager`] for every item it touches.
///
/// `should_*` methods authorize one item; returning `false` skips it (and its
/// subtree) without error. `should_proceed_after_*_error` methods decide
/// whether a failure is swallowed (`true`) or aborts the call (`false`).
///
/// Every method defaults to `true`. Installing no delegate is equivalent to
/// authorizing everything and aborting on the first failure.
///
/// Reported paths are not uniform. Copy and link report the caller's paths
/// with child names joined on. Removing a file reports the caller's path,
/// but removing a directory reports absolute paths for it and everything
/// below. Move always reports absolute paths. Callers rely on this, so it is
/// kept as is.
pub trait FileManagerDelegate: Send + Sync {
    fn should_copy(&self, _src: &Path, _dst: &Path) -> bool {
        true
    }

    fn should_proceed_after_copy_error(&self, _err: &FsError, _src: &Path, _dst: &Path) -> bool {
        true
    }

    fn should_move(&self, _src: &Path, _dst: &Path) -> bool {
        true
    }

    fn should_proceed_after_move_error(&self, _err: &FsError, _src: &Path, _dst: &Path) -> bool {
        true
    }

    fn should_link(&self, _src: &Path, _dst: &Path) -> bool {
        true
    }

    fn should_proceed_after_link_error(&self, _err: &FsError, _src: &Path, _dst: &Path) -> bool {
        true
    }

    fn should_remove(&self, _path: &Path) -> bool {
        true
    }

    fn should_proceed_after_remove_error(&self, _err: &FsError, _path: &Path) -> bool {
        true
    }
}

/// Delegate-less behavior: authorize everything, recover from nothing.
pub(crate) fn ask(
    delegate: Option<&dyn FileManagerDelegate>,
    f: impl FnOnce(&dyn FileManagerDelegate) -> bool,
) -> bool {
    delegate.is_none_or(f)
}

pub(crate) fn recover(
    delegate: Option<&dyn FileManagerDelegate>,
    f: impl FnOnce(&dyn FileManagerDelegate) -> bool,
) -> bool {
    delegate.is_some_and(f)
}
