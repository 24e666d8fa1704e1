use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

use crate::path::standardize_lexically;

////////////////////////////////////////////////////////////////////////////////
// #region DirectoryListing

/// Child names of `path_dir`, sorted by name.
pub(crate) fn read_dir_sorted(path_dir: &Path) -> io::Result<Vec<OsString>> {
    let mut l_names = Vec::new();
    for _entry_res in fs::read_dir(path_dir)? {
        let entry = _entry_res?;
        l_names.push(entry.file_name());
    }
    l_names.sort();
    Ok(l_names)
}

/// Join relative components with `/` regardless of host separator.
pub(crate) fn join_slash(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        return name.to_string();
    }
    format!("{prefix}/{name}")
}

/// `true` when `path_dst` is `path_src` or lies below it, compared both
/// lexically and through the real location of the destination's parent.
pub(crate) fn is_nested_destination(path_src: &Path, path_dst: &Path) -> bool {
    let path_src_std = standardize_lexically(path_src);
    let path_dst_std = standardize_lexically(path_dst);
    if path_dst_std.starts_with(&path_src_std) {
        return true;
    }
    let (Ok(path_src_real), Some(path_parent), Some(name)) = (
        fs::canonicalize(&path_src_std),
        path_dst_std.parent(),
        path_dst_std.file_name(),
    ) else {
        return false;
    };
    fs::canonicalize(path_parent)
        .map(|path_parent_real| path_parent_real.join(name).starts_with(&path_src_real))
        .unwrap_or(false)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Symlinks

/// Create a link at `path_link` whose stored target is `target`.
///
/// `b_target_is_dir` picks the Windows link flavour and is ignored elsewhere.
pub(crate) fn create_symbolic_link(
    path_link: &Path,
    target: &Path,
    b_target_is_dir: bool,
) -> io::Result<()> {
    #[cfg(unix)]
    {
        let _ = b_target_is_dir;
        std::os::unix::fs::symlink(target, path_link)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if b_target_is_dir {
            symlink_dir(target, path_link)
        } else {
            symlink_file(target, path_link)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (path_link, target, b_target_is_dir);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

/// Recreate the link at `path_src` as `path_dst` with the same stored target.
pub(crate) fn copy_symbolic_link(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let target = fs::read_link(path_src)?;
    let b_target_is_dir = fs::metadata(path_src).map(|m| m.is_dir()).unwrap_or(false);
    create_symbolic_link(path_dst, &target, b_target_is_dir)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileCopy

/// Copy file bytes into a newly created `path_file_dst`, then carry over
/// permissions, access/modification times and extended attributes.
///
/// The destination is opened with `create_new`, so an existing item is never
/// overwritten and surfaces as `AlreadyExists`.
pub(crate) fn copy_file_with_metadata(path_file_src: &Path, path_file_dst: &Path) -> io::Result<()> {
    let mut file_src = fs::File::open(path_file_src)?;
    let mut file_dst = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path_file_dst)?;
    io::copy(&mut file_src, &mut file_dst)?;
    drop(file_dst);
    apply_metadata(path_file_src, path_file_dst)
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> io::Result<()> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(unix)]
    copy_xattrs(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(unix)]
fn copy_xattrs(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                target: "treekit_fs::copy",
                "xattr {:?} not copied to {} ({e})",
                name,
                path_file_dst.display()
            );
        }
    }
}

/// Best-effort cleanup of a partially written tree.
pub(crate) fn remove_partial(path: &Path) {
    let res = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return,
    };
    if let Err(e) = res {
        tracing::warn!(
            target: "treekit_fs::move",
            "failed to clean up partial destination {} ({e})",
            path.display()
        );
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn read_dir_sorted_orders_by_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for name in ["c", "a", "b"] {
            fs::write(tmp.path().join(name), b"x").expect("write");
        }
        let l_names = read_dir_sorted(tmp.path()).expect("list");
        assert_eq!(l_names, vec!["a", "b", "c"]);
    }

    #[test]
    fn nested_destination_is_detected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        fs::create_dir(root.join("dir")).expect("mkdir");
        assert!(is_nested_destination(&root.join("dir"), &root.join("dir")));
        assert!(is_nested_destination(&root.join("dir"), &root.join("dir/sub")));
        assert!(is_nested_destination(&root.join("dir"), &root.join("dir/./a/../sub")));
        assert!(!is_nested_destination(&root.join("dir"), &root.join("dir2")));
        assert!(!is_nested_destination(&root.join("dir/sub"), &root.join("dir")));
    }

    #[cfg(unix)]
    #[test]
    fn nested_destination_through_link_is_detected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        fs::create_dir(root.join("dir")).expect("mkdir");
        std::os::unix::fs::symlink("dir", root.join("alias")).expect("symlink");
        assert!(is_nested_destination(&root.join("dir"), &root.join("alias/sub")));
    }

    #[test]
    fn join_slash_skips_empty_prefix() {
        assert_eq!(join_slash("", "a"), "a");
        assert_eq!(join_slash("a", "b"), "a/b");
    }

    #[test]
    fn copy_file_never_overwrites() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        fs::write(&path_src, b"payload").expect("write src");
        fs::write(&path_dst, b"keep").expect("write dst");

        let err = copy_file_with_metadata(&path_src, &path_dst).expect_err("exists");
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&path_dst).expect("read"), b"keep");
    }

    #[test]
    fn copy_file_preserves_modification_time() {
        use filetime::{FileTime, set_file_mtime};

        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_dst = tmp.path().join("dst");
        fs::write(&path_src, b"payload").expect("write src");
        set_file_mtime(&path_src, FileTime::from_unix_time(1_000_000, 0)).expect("mtime");

        copy_file_with_metadata(&path_src, &path_dst).expect("copy");
        let meta_dst = fs::metadata(&path_dst).expect("stat");
        assert_eq!(
            FileTime::from_last_modification_time(&meta_dst).unix_seconds(),
            1_000_000
        );
        assert_eq!(fs::read(&path_dst).expect("read"), b"payload");
    }

    #[cfg(unix)]
    #[test]
    fn copy_symbolic_link_keeps_stored_target() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::os::unix::fs::symlink("nowhere", tmp.path().join("a")).expect("symlink");
        copy_symbolic_link(&tmp.path().join("a"), &tmp.path().join("b")).expect("copy");
        assert_eq!(
            fs::read_link(tmp.path().join("b")).expect("read_link"),
            PathBuf::from("nowhere")
        );
    }
}
