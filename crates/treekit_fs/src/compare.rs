//! Structural and byte-level tree comparison.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::util::read_dir_sorted;

const N_BUFFER_BYTES: usize = 64 * 1024;

/// `true` when both items have the same type and content.
///
/// Links compare their stored targets; directories compare their name sets
/// and then every pair of children. Any I/O failure makes the items unequal.
pub(crate) fn contents_equal(path_a: &Path, path_b: &Path) -> bool {
    let (Ok(meta_a), Ok(meta_b)) = (fs::symlink_metadata(path_a), fs::symlink_metadata(path_b))
    else {
        return false;
    };
    if path_a == path_b {
        return true;
    }
    let (type_a, type_b) = (meta_a.file_type(), meta_b.file_type());

    if type_a.is_symlink() || type_b.is_symlink() {
        if !(type_a.is_symlink() && type_b.is_symlink()) {
            return false;
        }
        return match (fs::read_link(path_a), fs::read_link(path_b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
    }
    if type_a.is_dir() || type_b.is_dir() {
        if !(type_a.is_dir() && type_b.is_dir()) {
            return false;
        }
        return directories_equal(path_a, path_b);
    }
    if type_a.is_file() && type_b.is_file() {
        if meta_a.len() != meta_b.len() {
            return false;
        }
        return files_equal(path_a, path_b).unwrap_or(false);
    }
    special_files_equal(&meta_a, &meta_b)
}

fn directories_equal(path_a: &Path, path_b: &Path) -> bool {
    let (Ok(l_names_a), Ok(l_names_b)) = (read_dir_sorted(path_a), read_dir_sorted(path_b)) else {
        return false;
    };
    if l_names_a != l_names_b {
        tracing::trace!(
            target: "treekit_fs::compare",
            "entry sets differ: {} vs {}",
            path_a.display(),
            path_b.display()
        );
        return false;
    }
    l_names_a
        .iter()
        .all(|name| contents_equal(&path_a.join(name), &path_b.join(name)))
}

fn files_equal(path_a: &Path, path_b: &Path) -> io::Result<bool> {
    let mut file_a = fs::File::open(path_a)?;
    let mut file_b = fs::File::open(path_b)?;
    let mut buf_a = vec![0_u8; N_BUFFER_BYTES];
    let mut buf_b = vec![0_u8; N_BUFFER_BYTES];

    loop {
        let n_read_a = read_full(&mut file_a, &mut buf_a)?;
        let n_read_b = read_full(&mut file_b, &mut buf_b)?;
        if n_read_a != n_read_b || buf_a[..n_read_a] != buf_b[..n_read_b] {
            return Ok(false);
        }
        if n_read_a == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` unless EOF comes first.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut n_total = 0;
    while n_total < buf.len() {
        match reader.read(&mut buf[n_total..]) {
            Ok(0) => break,
            Ok(n) => n_total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(n_total)
}

#[cfg(unix)]
fn special_files_equal(meta_a: &fs::Metadata, meta_b: &fs::Metadata) -> bool {
    use std::os::unix::fs::{FileTypeExt, MetadataExt};

    let (type_a, type_b) = (meta_a.file_type(), meta_b.file_type());
    if type_a.is_char_device() || type_a.is_block_device() {
        return type_a.is_char_device() == type_b.is_char_device()
            && type_a.is_block_device() == type_b.is_block_device()
            && meta_a.rdev() == meta_b.rdev();
    }
    meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino()
}

#[cfg(not(unix))]
fn special_files_equal(_meta_a: &fs::Metadata, _meta_b: &fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("sub")).expect("mkdir");
        fs::write(root.join("a"), b"alpha").expect("write");
        fs::write(root.join("sub/b"), vec![7_u8; N_BUFFER_BYTES + 3]).expect("write");
    }

    #[test]
    fn identical_trees_are_equal() {
        let tmp = tempfile::tempdir().expect("tempdir");
        build_tree(&tmp.path().join("x"));
        build_tree(&tmp.path().join("y"));
        assert!(contents_equal(&tmp.path().join("x"), &tmp.path().join("y")));
    }

    #[test]
    fn one_changed_byte_breaks_equality() {
        let tmp = tempfile::tempdir().expect("tempdir");
        build_tree(&tmp.path().join("x"));
        build_tree(&tmp.path().join("y"));
        let mut payload = vec![7_u8; N_BUFFER_BYTES + 3];
        payload[N_BUFFER_BYTES + 1] = 8;
        fs::write(tmp.path().join("y/sub/b"), payload).expect("write");
        assert!(!contents_equal(&tmp.path().join("x"), &tmp.path().join("y")));
    }

    #[test]
    fn type_mismatch_and_missing_are_unequal() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(tmp.path().join("d")).expect("mkdir");
        fs::write(tmp.path().join("f"), b"").expect("write");
        assert!(!contents_equal(&tmp.path().join("d"), &tmp.path().join("f")));
        assert!(!contents_equal(&tmp.path().join("f"), &tmp.path().join("nope")));
        assert!(!contents_equal(&tmp.path().join("nope"), &tmp.path().join("nope")));
        assert!(contents_equal(&tmp.path().join("d"), &tmp.path().join("d")));
    }

    #[test]
    fn differing_entry_sets_are_unequal() {
        let tmp = tempfile::tempdir().expect("tempdir");
        build_tree(&tmp.path().join("x"));
        build_tree(&tmp.path().join("y"));
        fs::write(tmp.path().join("y/extra"), b"").expect("write");
        assert!(!contents_equal(&tmp.path().join("x"), &tmp.path().join("y")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_compare_targets() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        symlink("t1", root.join("l1")).expect("symlink");
        symlink("t1", root.join("l2")).expect("symlink");
        symlink("t2", root.join("l3")).expect("symlink");
        assert!(contents_equal(&root.join("l1"), &root.join("l2")));
        assert!(!contents_equal(&root.join("l1"), &root.join("l3")));
    }
}
