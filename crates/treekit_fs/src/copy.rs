//! Recursive copy and hard-link of files and directory trees.

use std::fs;
use std::path::{Path, PathBuf};

use crate::delegate::{FileManagerDelegate, ask, recover};
use crate::error::{EnumFsOperation, FsError, FsResult};
use crate::util::{
    copy_file_with_metadata, copy_symbolic_link, is_nested_destination, read_dir_sorted,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnumTreeMode {
    Copy,
    Link,
}

impl EnumTreeMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Link => "link",
        }
    }
}

/// One side of a traversal step: where the item lives and how it is reported.
#[derive(Debug, Clone)]
struct SpecItemPath {
    path_abs: PathBuf,
    path_reported: PathBuf,
}

impl SpecItemPath {
    fn join(&self, name: &std::ffi::OsStr) -> Self {
        Self {
            path_abs: self.path_abs.join(name),
            path_reported: self.path_reported.join(name),
        }
    }
}

struct SpecTreeContext<'a> {
    mode: EnumTreeMode,
    delegate: Option<&'a dyn FileManagerDelegate>,
}

impl SpecTreeContext<'_> {
    fn should_process(&self, src: &Path, dst: &Path) -> bool {
        match self.mode {
            EnumTreeMode::Copy => ask(self.delegate, |d| d.should_copy(src, dst)),
            EnumTreeMode::Link => ask(self.delegate, |d| d.should_link(src, dst)),
        }
    }

    /// `Ok(())` when the delegate swallows `err`, otherwise `Err(err)`.
    fn handle_error(&self, err: FsError, src: &Path, dst: &Path) -> FsResult<()> {
        let b_continue = match self.mode {
            EnumTreeMode::Copy => recover(self.delegate, |d| {
                d.should_proceed_after_copy_error(&err, src, dst)
            }),
            EnumTreeMode::Link => recover(self.delegate, |d| {
                d.should_proceed_after_link_error(&err, src, dst)
            }),
        };
        if !b_continue {
            return Err(err);
        }
        tracing::warn!(
            target: "treekit_fs::copy",
            "{} delegate recovered from {err} ({} -> {})",
            self.mode.as_str(),
            src.display(),
            dst.display()
        );
        Ok(())
    }
}

/// Copy or link `src` to `dst`.
///
/// `*_abs` are the locations on disk; `*_reported` are the caller's paths and
/// are what the delegate sees (children are joined onto them). A missing
/// source fails before any delegate call.
pub(crate) fn process_tree(
    mode: EnumTreeMode,
    path_src_abs: &Path,
    path_dst_abs: &Path,
    path_src_reported: &Path,
    path_dst_reported: &Path,
    delegate: Option<&dyn FileManagerDelegate>,
) -> FsResult<()> {
    let meta_src = fs::symlink_metadata(path_src_abs)
        .map_err(|e| FsError::from_io(e, EnumFsOperation::Read, path_src_reported))?;
    tracing::debug!(
        target: "treekit_fs::copy",
        "{} {} -> {}",
        mode.as_str(),
        path_src_abs.display(),
        path_dst_abs.display()
    );

    let spec_tree_ctx = SpecTreeContext { mode, delegate };
    if meta_src.is_dir() && is_nested_destination(path_src_abs, path_dst_abs) {
        tracing::debug!(
            target: "treekit_fs::copy",
            "destination {} lies inside source {}",
            path_dst_abs.display(),
            path_src_abs.display()
        );
        let err = FsError::invalid_argument(EnumFsOperation::Write, path_dst_reported);
        return spec_tree_ctx.handle_error(err, path_src_reported, path_dst_reported);
    }
    let src = SpecItemPath {
        path_abs: path_src_abs.to_path_buf(),
        path_reported: path_src_reported.to_path_buf(),
    };
    let dst = SpecItemPath {
        path_abs: path_dst_abs.to_path_buf(),
        path_reported: path_dst_reported.to_path_buf(),
    };
    walk_item(&src, &dst, meta_src.file_type(), &spec_tree_ctx)
}

fn walk_item(
    src: &SpecItemPath,
    dst: &SpecItemPath,
    cfg_file_type: fs::FileType,
    spec_tree_ctx: &SpecTreeContext<'_>,
) -> FsResult<()> {
    if !spec_tree_ctx.should_process(&src.path_reported, &dst.path_reported) {
        tracing::trace!(
            target: "treekit_fs::copy",
            "skipped by delegate: {}",
            src.path_reported.display()
        );
        return Ok(());
    }

    if cfg_file_type.is_dir() && !cfg_file_type.is_symlink() {
        return walk_directory(src, dst, spec_tree_ctx);
    }

    tracing::trace!(
        target: "treekit_fs::copy",
        "{} item {}",
        spec_tree_ctx.mode.as_str(),
        src.path_reported.display()
    );
    if let Err(err) = process_leaf(src, dst, cfg_file_type, spec_tree_ctx.mode) {
        return spec_tree_ctx.handle_error(err, &src.path_reported, &dst.path_reported);
    }
    Ok(())
}

fn walk_directory(
    src: &SpecItemPath,
    dst: &SpecItemPath,
    spec_tree_ctx: &SpecTreeContext<'_>,
) -> FsResult<()> {
    if let Err(e) = fs::create_dir(&dst.path_abs) {
        let err = FsError::from_io(e, EnumFsOperation::Write, &dst.path_reported);
        return spec_tree_ctx.handle_error(err, &src.path_reported, &dst.path_reported);
    }

    let l_names = match read_dir_sorted(&src.path_abs) {
        Ok(v) => v,
        Err(e) => {
            let err = FsError::from_io(e, EnumFsOperation::Read, &src.path_reported);
            return spec_tree_ctx.handle_error(err, &src.path_reported, &dst.path_reported);
        }
    };

    for name in l_names {
        let src_child = src.join(&name);
        let dst_child = dst.join(&name);
        let cfg_file_type = match fs::symlink_metadata(&src_child.path_abs) {
            Ok(meta) => meta.file_type(),
            Err(e) => {
                let err = FsError::from_io(e, EnumFsOperation::Read, &src_child.path_reported);
                spec_tree_ctx.handle_error(
                    err,
                    &src_child.path_reported,
                    &dst_child.path_reported,
                )?;
                continue;
            }
        };
        walk_item(&src_child, &dst_child, cfg_file_type, spec_tree_ctx)?;
    }

    if spec_tree_ctx.mode == EnumTreeMode::Copy {
        apply_directory_permissions(&src.path_abs, &dst.path_abs);
    }
    Ok(())
}

fn process_leaf(
    src: &SpecItemPath,
    dst: &SpecItemPath,
    cfg_file_type: fs::FileType,
    mode: EnumTreeMode,
) -> FsResult<()> {
    let res = if cfg_file_type.is_symlink() {
        copy_symbolic_link(&src.path_abs, &dst.path_abs)
    } else {
        match mode {
            EnumTreeMode::Link => fs::hard_link(&src.path_abs, &dst.path_abs),
            EnumTreeMode::Copy if cfg_file_type.is_file() => {
                copy_file_with_metadata(&src.path_abs, &dst.path_abs)
            }
            EnumTreeMode::Copy => {
                return Err(FsError::unsupported(
                    EnumFsOperation::Read,
                    &src.path_reported,
                ));
            }
        }
    };
    res.map_err(|e| FsError::from_io(e, EnumFsOperation::Write, &dst.path_reported))
}

/// Directory modes are applied after the children so a read-only source
/// directory does not block its own copy.
fn apply_directory_permissions(path_dir_src: &Path, path_dir_dst: &Path) {
    let res = fs::metadata(path_dir_src)
        .and_then(|stat_src| fs::set_permissions(path_dir_dst, stat_src.permissions()));
    if let Err(e) = res {
        tracing::debug!(
            target: "treekit_fs::copy",
            "permissions not applied to {} ({e})",
            path_dir_dst.display()
        );
    }
}
