//! Path resolution on raw paths: symlink expansion, lexical standardization
//! and the automount alias table.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{EnumFsErrorKind, EnumFsOperation, FsError, FsResult, HostErrorCode};

/// Upper bound on link expansions during one resolution.
pub const MAX_SYMLINK_EXPANSIONS: usize = 32;

////////////////////////////////////////////////////////////////////////////////
// #region AliasTable

/// Prefix rewrites applied after lexical standardization.
///
/// Entries are matched in order on whole components; the first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomountAliasTable {
    entries: Vec<(PathBuf, PathBuf)>,
}

impl AutomountAliasTable {
    pub fn new<I, P, Q>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, Q)>,
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(prefix, replacement)| (prefix.into(), replacement.into()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Darwin firmlink/automount indirections.
    pub fn darwin() -> Self {
        Self::new([
            ("/private/var/automount", "/"),
            ("/var/automount", "/"),
            ("/private/tmp", "/tmp"),
            ("/private/var", "/var"),
            ("/private/etc", "/etc"),
        ])
    }

    /// Table for the build target.
    pub fn host() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            Self::darwin()
        } else {
            Self::empty()
        }
    }

    pub fn entries(&self) -> &[(PathBuf, PathBuf)] {
        &self.entries
    }

    /// Rewrite `path` with the first matching entry.
    pub fn apply(&self, path: &Path) -> PathBuf {
        for (path_prefix, path_replacement) in &self.entries {
            if let Ok(path_rest) = path.strip_prefix(path_prefix) {
                if path_rest.as_os_str().is_empty() {
                    return path_replacement.clone();
                }
                return path_replacement.join(path_rest);
            }
        }
        path.to_path_buf()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Standardize

/// Collapse `.`, `..`, duplicate and trailing separators without touching the
/// filesystem. `..` never climbs above the root; leading `..` of a relative
/// path are kept.
pub fn standardize_lexically(path: &Path) -> PathBuf {
    let mut l_parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match l_parts.last() {
                Some(Component::Normal(_)) => {
                    l_parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => l_parts.push(component),
            },
            _ => l_parts.push(component),
        }
    }
    if l_parts.is_empty() {
        return PathBuf::from(".");
    }
    l_parts.iter().map(|c| c.as_os_str()).collect()
}

/// Lexical standardization followed by the alias table.
pub fn standardize(path: &Path, aliases: &AutomountAliasTable) -> PathBuf {
    aliases.apply(&standardize_lexically(path))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Symlinks

fn error_too_many_links(path: &Path) -> FsError {
    let err = FsError::new(EnumFsErrorKind::Unknown, EnumFsOperation::Read, path);
    #[cfg(unix)]
    let err = err.with_host_code(HostErrorCode::Posix(libc::ELOOP));
    #[cfg(windows)]
    let err = err.with_host_code(HostErrorCode::Windows(1921));
    err
}

fn push_reversed(l_pending: &mut Vec<OsString>, path: &Path) {
    for component in path.components().rev() {
        match component {
            Component::Normal(name) => l_pending.push(name.to_os_string()),
            Component::ParentDir => l_pending.push(OsString::from("..")),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
}

fn root_of(path: &Path) -> PathBuf {
    path.components()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .map(|c| c.as_os_str())
        .collect()
}

/// Expand every symbolic link along `path` (relative paths are taken against
/// `cwd`). No standardization pass runs afterwards, so the result is exactly
/// what the links spell out.
///
/// Components that do not exist are appended verbatim. More than
/// [`MAX_SYMLINK_EXPANSIONS`] expansions fail with an `Unknown` read error
/// carrying the host's "too many links" code.
pub fn resolve_symbolic_links(path: &Path, cwd: &Path) -> FsResult<PathBuf> {
    let path_abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut path_resolved = root_of(&path_abs);
    let mut l_pending: Vec<OsString> = Vec::new();
    push_reversed(&mut l_pending, &path_abs);
    let mut n_expansions = 0_usize;

    while let Some(part) = l_pending.pop() {
        if part.as_os_str() == OsStr::new("..") {
            path_resolved.pop();
            continue;
        }
        let path_candidate = path_resolved.join(&part);
        match fs::symlink_metadata(&path_candidate) {
            Ok(meta) if meta.file_type().is_symlink() => {
                n_expansions += 1;
                if n_expansions > MAX_SYMLINK_EXPANSIONS {
                    return Err(error_too_many_links(path));
                }
                let path_target = fs::read_link(&path_candidate)
                    .map_err(|e| FsError::from_io(e, EnumFsOperation::Read, &path_candidate))?;
                if path_target.is_absolute() {
                    path_resolved = root_of(&path_target);
                }
                push_reversed(&mut l_pending, &path_target);
            }
            Ok(_) => path_resolved = path_candidate,
            Err(_) => {
                path_resolved = path_candidate;
                while let Some(rest) = l_pending.pop() {
                    path_resolved.push(rest);
                }
            }
        }
    }
    Ok(path_resolved)
}

/// Target stored in the link at `path`.
///
/// A missing item is `NoSuchFile`; an existing item that is not a link is an
/// `Unknown` read failure.
pub fn destination_of_symbolic_link(path: &Path, path_reported: &Path) -> FsResult<PathBuf> {
    let meta = fs::symlink_metadata(path)
        .map_err(|e| FsError::from_io(e, EnumFsOperation::Read, path_reported))?;
    if !meta.file_type().is_symlink() {
        let err = FsError::new(EnumFsErrorKind::Unknown, EnumFsOperation::Read, path_reported);
        #[cfg(unix)]
        let err = err.with_host_code(HostErrorCode::Posix(libc::EINVAL));
        return Err(err);
    }
    fs::read_link(path).map_err(|e| {
        let err = FsError::from_io(e, EnumFsOperation::Read, path_reported);
        match err.kind() {
            EnumFsErrorKind::NoSuchFile => FsError::new(
                EnumFsErrorKind::Unknown,
                EnumFsOperation::Read,
                path_reported,
            ),
            _ => err,
        }
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
