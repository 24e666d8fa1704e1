//! Host metadata to [`ItemAttributes`] and back.

#[cfg(unix)]
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{EnumFsOperation, FsError, FsResult};
use crate::spec::{AttributeValue, EnumAttributeKey, EnumFileType, ItemAttributes, Timestamp};

////////////////////////////////////////////////////////////////////////////////
// #region Flags

#[cfg(any(target_os = "macos", target_os = "freebsd"))]
mod flags {
    use std::ffi::CString;
    use std::fs;
    use std::io;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    pub(super) const UF_IMMUTABLE: u32 = 0x0000_0002;
    pub(super) const UF_APPEND: u32 = 0x0000_0004;
    pub(super) const SF_IMMUTABLE: u32 = 0x0002_0000;
    pub(super) const SF_APPEND: u32 = 0x0004_0000;

    pub(super) fn read(meta: &fs::Metadata) -> Option<u32> {
        #[cfg(target_os = "macos")]
        use std::os::macos::fs::MetadataExt;
        #[cfg(target_os = "freebsd")]
        use std::os::freebsd::fs::MetadataExt;
        Some(meta.st_flags())
    }

    pub(super) fn write(path: &Path, n_flags: u32) -> io::Result<()> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: `c_path` is a valid NUL-terminated string for the call.
        let rc = unsafe { libc::lchflags(c_path.as_ptr(), n_flags as _) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(any(target_os = "macos", target_os = "freebsd")))]
mod flags {
    use std::fs;
    use std::io;
    use std::path::Path;

    pub(super) const UF_IMMUTABLE: u32 = 0;
    pub(super) const UF_APPEND: u32 = 0;
    pub(super) const SF_IMMUTABLE: u32 = 0;
    pub(super) const SF_APPEND: u32 = 0;

    pub(super) fn read(_meta: &fs::Metadata) -> Option<u32> {
        None
    }

    pub(super) fn write(_path: &Path, _n_flags: u32) -> io::Result<()> {
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Read

/// Attributes of the item at `path`, without following a final symlink.
pub(crate) fn attributes_of_item(path: &Path, path_reported: &Path) -> FsResult<ItemAttributes> {
    let meta = fs::symlink_metadata(path)
        .map_err(|e| FsError::from_io(e, EnumFsOperation::Read, path_reported))?;
    let enum_file_type = EnumFileType::from(meta.file_type());

    let mut attrs = ItemAttributes::new()
        .with(EnumAttributeKey::Type, enum_file_type)
        .with(EnumAttributeKey::Size, meta.len());

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        attrs.insert(EnumAttributeKey::PosixPermissions, meta.mode() & 0o7777);
        attrs.insert(EnumAttributeKey::ReferenceCount, meta.nlink());
        attrs.insert(EnumAttributeKey::SystemNumber, meta.dev());
        attrs.insert(EnumAttributeKey::SystemFileNumber, meta.ino());
        attrs.insert(EnumAttributeKey::OwnerAccountId, meta.uid());
        attrs.insert(EnumAttributeKey::GroupOwnerAccountId, meta.gid());
        if matches!(
            enum_file_type,
            EnumFileType::CharacterSpecial | EnumFileType::BlockSpecial
        ) {
            attrs.insert(EnumAttributeKey::DeviceIdentifier, meta.rdev());
        }
    }
    #[cfg(not(unix))]
    {
        let mut n_mode: u32 = if meta.permissions().readonly() { 0o444 } else { 0o644 };
        if meta.is_dir() {
            n_mode |= 0o111;
        }
        attrs.insert(EnumAttributeKey::PosixPermissions, n_mode);
        attrs.insert(EnumAttributeKey::ReferenceCount, 1_u64);
    }

    if let Ok(v) = meta.modified() {
        attrs.insert(EnumAttributeKey::ModificationDate, v);
    }
    if let Ok(v) = meta.accessed() {
        attrs.insert(EnumAttributeKey::AccessDate, v);
    }
    if let Ok(v) = meta.created() {
        attrs.insert(EnumAttributeKey::CreationDate, v);
    }

    if let Some(n_flags) = flags::read(&meta) {
        attrs.insert(
            EnumAttributeKey::Immutable,
            n_flags & (flags::UF_IMMUTABLE | flags::SF_IMMUTABLE) != 0,
        );
        attrs.insert(
            EnumAttributeKey::AppendOnly,
            n_flags & (flags::UF_APPEND | flags::SF_APPEND) != 0,
        );
    }

    #[cfg(unix)]
    {
        let dict_xattrs = read_xattrs(path);
        if !dict_xattrs.is_empty() {
            attrs.insert(
                EnumAttributeKey::ExtendedAttributes,
                AttributeValue::Bytes(dict_xattrs),
            );
        }
    }

    Ok(attrs)
}

#[cfg(unix)]
fn read_xattrs(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut dict_xattrs = BTreeMap::new();
    let Ok(iter_xattr_names) = xattr::list(path) else {
        return dict_xattrs;
    };
    for name in iter_xattr_names {
        if let Some(raw_value) = xattr::get(path, &name).ok().flatten() {
            dict_xattrs.insert(name.to_string_lossy().into_owned(), raw_value);
        }
    }
    dict_xattrs
}

/// Volume statistics for the file system containing `path`.
#[cfg(unix)]
pub(crate) fn attributes_of_file_system(
    path: &Path,
    path_reported: &Path,
) -> FsResult<ItemAttributes> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::fs::MetadataExt;

    let to_err = |e: io::Error| FsError::from_io(e, EnumFsOperation::Read, path_reported);
    let meta = fs::metadata(path).map_err(to_err)?;
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| to_err(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

    // SAFETY: zeroed `statvfs` is a valid out-parameter; `c_path` is NUL-terminated.
    let mut stat_vfs: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat_vfs) };
    if rc != 0 {
        return Err(to_err(io::Error::last_os_error()));
    }

    let n_fragment = stat_vfs.f_frsize as u64;
    Ok(ItemAttributes::new()
        .with(EnumAttributeKey::SystemSize, stat_vfs.f_blocks as u64 * n_fragment)
        .with(EnumAttributeKey::SystemFreeSize, stat_vfs.f_bavail as u64 * n_fragment)
        .with(EnumAttributeKey::SystemNodes, stat_vfs.f_files as u64)
        .with(EnumAttributeKey::SystemFreeNodes, stat_vfs.f_ffree as u64)
        .with(EnumAttributeKey::SystemNumber, meta.dev()))
}

#[cfg(not(unix))]
pub(crate) fn attributes_of_file_system(
    path: &Path,
    path_reported: &Path,
) -> FsResult<ItemAttributes> {
    fs::metadata(path).map_err(|e| FsError::from_io(e, EnumFsOperation::Read, path_reported))?;
    Err(FsError::new(
        crate::error::EnumFsErrorKind::Unknown,
        EnumFsOperation::Read,
        path_reported,
    ))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Write

fn warn_dropped(key: EnumAttributeKey, value: &AttributeValue) {
    tracing::warn!(
        target: "treekit_fs::attributes",
        "dropping malformed {key} value: {value:?}"
    );
}

fn valid_date(attrs: &ItemAttributes, key: EnumAttributeKey) -> Option<filetime::FileTime> {
    let value = attrs.get(key)?;
    let ts: Timestamp = match value.as_date() {
        Some(v) => v,
        None => {
            warn_dropped(key, value);
            return None;
        }
    };
    match ts.to_system_time() {
        Some(t) => Some(filetime::FileTime::from_system_time(t)),
        None => {
            warn_dropped(key, value);
            None
        }
    }
}

fn valid_flag(attrs: &ItemAttributes, key: EnumAttributeKey) -> Option<bool> {
    let value = attrs.get(key)?;
    let b_flag = value.as_bool();
    if b_flag.is_none() {
        warn_dropped(key, value);
    }
    b_flag
}

/// Apply the writable keys of `attrs` to `path`.
///
/// Flags being cleared are cleared first and flags being set are set last, so
/// an immutable item can be modified in one call. Read-only keys are ignored
/// and malformed values are dropped.
pub(crate) fn set_attributes(
    attrs: &ItemAttributes,
    path: &Path,
    path_reported: &Path,
) -> FsResult<()> {
    let to_err = |e: io::Error| FsError::from_io(e, EnumFsOperation::Write, path_reported);
    let meta = fs::symlink_metadata(path).map_err(to_err)?;
    tracing::debug!(
        target: "treekit_fs::attributes",
        "set {} attribute(s) on {}",
        attrs.len(),
        path.display()
    );

    let b_immutable = valid_flag(attrs, EnumAttributeKey::Immutable);
    let b_append_only = valid_flag(attrs, EnumAttributeKey::AppendOnly);
    let n_flags_current = flags::read(&meta);
    if let Some(n_flags) = n_flags_current {
        let mut n_cleared = n_flags;
        if b_immutable == Some(false) {
            n_cleared &= !(flags::UF_IMMUTABLE | flags::SF_IMMUTABLE);
        }
        if b_append_only == Some(false) {
            n_cleared &= !(flags::UF_APPEND | flags::SF_APPEND);
        }
        if n_cleared != n_flags {
            flags::write(path, n_cleared).map_err(to_err)?;
        }
    }

    if let Some(value) = attrs.get(EnumAttributeKey::PosixPermissions) {
        match value.as_u64().filter(|n| *n <= 0o7777) {
            Some(n_mode) => set_mode(path, n_mode as u32).map_err(to_err)?,
            None => warn_dropped(EnumAttributeKey::PosixPermissions, value),
        }
    }

    #[cfg(unix)]
    {
        let owner = owner_id(attrs, EnumAttributeKey::OwnerAccountId);
        let group = owner_id(attrs, EnumAttributeKey::GroupOwnerAccountId);
        if owner.is_some() || group.is_some() {
            std::os::unix::fs::chown(path, owner, group).map_err(to_err)?;
        }
    }

    if let Some(file_time) = valid_date(attrs, EnumAttributeKey::ModificationDate) {
        filetime::set_file_mtime(path, file_time).map_err(to_err)?;
    }
    if let Some(file_time) = valid_date(attrs, EnumAttributeKey::AccessDate) {
        filetime::set_file_atime(path, file_time).map_err(to_err)?;
    }

    #[cfg(unix)]
    {
        if let Some(value) = attrs.get(EnumAttributeKey::ExtendedAttributes) {
            match value.as_bytes_map() {
                Some(dict_xattrs) => {
                    for (name, raw_value) in dict_xattrs {
                        if xattr::get(path, name).ok().flatten().as_ref() == Some(raw_value) {
                            continue;
                        }
                        xattr::set(path, name, raw_value).map_err(to_err)?;
                    }
                }
                None => warn_dropped(EnumAttributeKey::ExtendedAttributes, value),
            }
        }
    }

    if n_flags_current.is_some() && (b_immutable == Some(true) || b_append_only == Some(true)) {
        let meta = fs::symlink_metadata(path).map_err(to_err)?;
        let n_flags = flags::read(&meta).unwrap_or(0);
        let mut n_set = n_flags;
        if b_immutable == Some(true) {
            n_set |= flags::UF_IMMUTABLE;
        }
        if b_append_only == Some(true) {
            n_set |= flags::UF_APPEND;
        }
        if n_set != n_flags {
            flags::write(path, n_set).map_err(to_err)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn owner_id(attrs: &ItemAttributes, key: EnumAttributeKey) -> Option<u32> {
    let value = attrs.get(key)?;
    let id = value.as_u64().and_then(|n| u32::try_from(n).ok());
    if id.is_none() {
        warn_dropped(key, value);
    }
    id
}

#[cfg(unix)]
fn set_mode(path: &Path, n_mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(n_mode))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, n_mode: u32) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(n_mode & 0o222 == 0);
    fs::set_permissions(path, perms)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Access

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnumAccessMode {
    Read,
    Write,
    Execute,
}

#[cfg(unix)]
pub(crate) fn is_accessible(path: &Path, mode: EnumAccessMode) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    let n_mode = match mode {
        EnumAccessMode::Read => libc::R_OK,
        EnumAccessMode::Write => libc::W_OK,
        EnumAccessMode::Execute => libc::X_OK,
    };
    // SAFETY: `c_path` is NUL-terminated and outlives the call.
    unsafe { libc::access(c_path.as_ptr(), n_mode) == 0 }
}

#[cfg(not(unix))]
pub(crate) fn is_accessible(path: &Path, mode: EnumAccessMode) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    match mode {
        EnumAccessMode::Read => true,
        EnumAccessMode::Write => !meta.permissions().readonly(),
        EnumAccessMode::Execute => {
            meta.is_dir()
                || path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| {
                        ["exe", "bat", "cmd", "com"].contains(&e.to_ascii_lowercase().as_str())
                    })
        }
    }
}

/// An item is deletable when it exists and its parent directory accepts
/// writes.
pub(crate) fn is_deletable(path: &Path) -> bool {
    if fs::symlink_metadata(path).is_err() {
        return false;
    }
    let path_parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => return false,
    };
    is_accessible(path_parent, EnumAccessMode::Write)
        && (cfg!(not(unix)) || is_accessible(path_parent, EnumAccessMode::Execute))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
