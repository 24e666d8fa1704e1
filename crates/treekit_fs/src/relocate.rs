//! Move with cross-device fallback.

use std::fs;
use std::path::Path;

use crate::copy::{EnumTreeMode, process_tree};
use crate::delegate::{FileManagerDelegate, ask, recover};
use crate::error::{EnumFsErrorKind, EnumFsOperation, FsError, FsResult};
use crate::remove::remove_tree_quiet;
use crate::util::remove_partial;

/// Move `path_src` to `path_dst`; both are absolute and both are what the
/// delegate sees.
pub(crate) fn move_item(
    path_src: &Path,
    path_dst: &Path,
    delegate: Option<&dyn FileManagerDelegate>,
) -> FsResult<()> {
    if !ask(delegate, |d| d.should_move(path_src, path_dst)) {
        tracing::trace!(
            target: "treekit_fs::move",
            "skipped by delegate: {}",
            path_src.display()
        );
        return Ok(());
    }
    tracing::debug!(
        target: "treekit_fs::move",
        "move {} -> {}",
        path_src.display(),
        path_dst.display()
    );

    match try_move(path_src, path_dst) {
        Ok(()) => Ok(()),
        Err(err) => {
            if !recover(delegate, |d| {
                d.should_proceed_after_move_error(&err, path_src, path_dst)
            }) {
                return Err(err);
            }
            tracing::warn!(target: "treekit_fs::move", "delegate recovered from {err}");
            Ok(())
        }
    }
}

fn try_move(path_src: &Path, path_dst: &Path) -> FsResult<()> {
    fs::symlink_metadata(path_src)
        .map_err(|e| FsError::from_io(e, EnumFsOperation::Read, path_src))?;
    if fs::symlink_metadata(path_dst).is_ok() {
        return Err(FsError::already_exists(path_dst));
    }

    match fs::rename(path_src, path_dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            let err = FsError::from_io(e, EnumFsOperation::Write, path_dst);
            if err.kind() != EnumFsErrorKind::CrossDevice {
                return Err(err);
            }
            tracing::debug!(
                target: "treekit_fs::move",
                "rename refused across devices; copying {}",
                path_src.display()
            );
            move_across_devices(path_src, path_dst)
        }
    }
}

/// Copy then remove the source. The source is only touched after the copy
/// completed; a failed copy removes whatever reached the destination.
pub(crate) fn move_across_devices(path_src: &Path, path_dst: &Path) -> FsResult<()> {
    if let Err(err) = process_tree(
        EnumTreeMode::Copy,
        path_src,
        path_dst,
        path_src,
        path_dst,
        None,
    ) {
        remove_partial(path_dst);
        return Err(err);
    }
    remove_tree_quiet(path_src)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::record::RecordingDelegate;

    #[test]
    fn move_reports_absolute_paths() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        fs::write(root.join("a"), b"x").expect("write");
        let delegate = RecordingDelegate::new();

        move_item(&root.join("a"), &root.join("b"), Some(&delegate)).expect("move");
        assert_eq!(
            delegate.report().pairs(),
            vec![(root.join("a"), Some(root.join("b")))]
        );
        assert!(root.join("b").exists());
        assert!(!root.join("a").exists());
    }

    #[test]
    fn move_onto_existing_item_is_already_exists() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        fs::write(root.join("a"), b"new").expect("write");
        fs::write(root.join("b"), b"old").expect("write");

        let err = move_item(&root.join("a"), &root.join("b"), None).expect_err("exists");
        assert_eq!(err.kind(), EnumFsErrorKind::AlreadyExists);
        assert_eq!(fs::read(root.join("b")).expect("read"), b"old");
        assert!(root.join("a").exists());
    }

    #[test]
    fn missing_source_asks_then_reports_failure() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        let delegate = RecordingDelegate::new();

        move_item(&root.join("nope"), &root.join("dst"), Some(&delegate)).expect("recovered");
        let report = delegate.report();
        assert_eq!(report.call_count(), 1);
        assert_eq!(report.error_kinds(), vec![EnumFsErrorKind::NoSuchFile]);
        assert_eq!(report.errors[0].path, root.join("nope"));
    }

    #[test]
    fn fallback_copies_tree_then_removes_source() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        fs::create_dir_all(root.join("src/sub")).expect("mkdir");
        fs::write(root.join("src/sub/f"), b"payload").expect("write");

        move_across_devices(&root.join("src"), &root.join("dst")).expect("fallback");
        assert!(!root.join("src").exists());
        assert_eq!(fs::read(root.join("dst/sub/f")).expect("read"), b"payload");
    }

    #[cfg(unix)]
    #[test]
    fn failed_fallback_keeps_source_and_cleans_destination() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        fs::create_dir(root.join("src")).expect("mkdir");
        fs::write(root.join("src/a"), b"x").expect("write");
        // Sockets cannot be copied.
        let _listener =
            std::os::unix::net::UnixListener::bind(root.join("src/sock")).expect("bind");

        let err = move_across_devices(&root.join("src"), &root.join("dst")).expect_err("fails");
        assert_eq!(err.kind(), EnumFsErrorKind::Unknown);
        assert!(root.join("src/a").exists());
        assert!(!root.join("dst").exists());
    }
}
