//! Host error mapping.
//!
//! Every host failure is funneled through [`FsError::from_io`], which maps the
//! raw POSIX errno or Windows error code to one [`EnumFsErrorKind`] and keeps
//! the host code for diagnostics.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Portable error taxonomy. Identical on every host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumFsErrorKind {
    /// Item (or one of its parents) does not exist.
    NoSuchFile,
    /// Destination already exists.
    AlreadyExists,
    /// Caller lacks permission for the operation.
    PermissionDenied,
    /// A path component or the whole path is too long.
    NameTooLong,
    /// A path component used as a directory is not one.
    NotADirectory,
    /// A directory was given where a non-directory is required.
    IsADirectory,
    /// Volume or quota exhausted.
    DiskFull,
    /// Item is locked by another process (Windows).
    SharingViolation,
    /// Operation would cross a volume boundary.
    CrossDevice,
    /// Anything else, including wrong item kind on reads.
    Unknown,
}

impl EnumFsErrorKind {
    /// Stable identifier used in logs and bindings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSuchFile => "noSuchFile",
            Self::AlreadyExists => "alreadyExists",
            Self::PermissionDenied => "permissionDenied",
            Self::NameTooLong => "nameTooLong",
            Self::NotADirectory => "notADirectory",
            Self::IsADirectory => "isADirectory",
            Self::DiskFull => "diskFull",
            Self::SharingViolation => "sharingViolation",
            Self::CrossDevice => "crossDevice",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EnumFsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the failing call was reading or writing the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumFsOperation {
    Read,
    Write,
}

impl fmt::Display for EnumFsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Raw status code reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostErrorCode {
    /// POSIX `errno`.
    Posix(i32),
    /// Win32 `GetLastError` value.
    Windows(u32),
}

impl HostErrorCode {
    /// Extract the raw OS code of an I/O error, tagged with the current host.
    pub fn from_io(err: &io::Error) -> Option<Self> {
        let code = err.raw_os_error()?;
        if cfg!(windows) {
            Some(Self::Windows(code as u32))
        } else {
            Some(Self::Posix(code))
        }
    }

    /// Portable kind for this code.
    pub fn kind(self) -> EnumFsErrorKind {
        match self {
            Self::Posix(code) => map_posix_errno(code),
            Self::Windows(code) => map_windows_error(code),
        }
    }
}

impl fmt::Display for HostErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix(code) => write!(f, "errno {code}"),
            Self::Windows(code) => write!(f, "win32 error {code}"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MappingTables

#[cfg(unix)]
const TABLE_POSIX_ERRNO: &[(i32, EnumFsErrorKind)] = &[
    (libc::ENOENT, EnumFsErrorKind::NoSuchFile),
    (libc::EEXIST, EnumFsErrorKind::AlreadyExists),
    (libc::EACCES, EnumFsErrorKind::PermissionDenied),
    (libc::EPERM, EnumFsErrorKind::PermissionDenied),
    (libc::EROFS, EnumFsErrorKind::PermissionDenied),
    (libc::ENAMETOOLONG, EnumFsErrorKind::NameTooLong),
    (libc::ENOTDIR, EnumFsErrorKind::NotADirectory),
    (libc::EISDIR, EnumFsErrorKind::IsADirectory),
    (libc::ENOSPC, EnumFsErrorKind::DiskFull),
    (libc::EDQUOT, EnumFsErrorKind::DiskFull),
    (libc::EXDEV, EnumFsErrorKind::CrossDevice),
];

#[cfg(not(unix))]
const TABLE_POSIX_ERRNO: &[(i32, EnumFsErrorKind)] = &[];

pub(crate) const ERROR_FILE_NOT_FOUND: u32 = 2;
pub(crate) const ERROR_PATH_NOT_FOUND: u32 = 3;
pub(crate) const ERROR_ACCESS_DENIED: u32 = 5;
pub(crate) const ERROR_INVALID_ACCESS: u32 = 12;
pub(crate) const ERROR_INVALID_DRIVE: u32 = 15;
pub(crate) const ERROR_NOT_SAME_DEVICE: u32 = 17;
pub(crate) const ERROR_WRITE_FAULT: u32 = 29;
pub(crate) const ERROR_SHARING_VIOLATION: u32 = 32;
pub(crate) const ERROR_LOCK_VIOLATION: u32 = 33;
pub(crate) const ERROR_HANDLE_DISK_FULL: u32 = 39;
pub(crate) const ERROR_NOT_SUPPORTED: u32 = 50;
pub(crate) const ERROR_FILE_EXISTS: u32 = 80;
pub(crate) const ERROR_INVALID_PARAMETER: u32 = 87;
pub(crate) const ERROR_DISK_FULL: u32 = 112;
pub(crate) const ERROR_INVALID_NAME: u32 = 123;
pub(crate) const ERROR_LABEL_TOO_LONG: u32 = 154;
pub(crate) const ERROR_BAD_PATHNAME: u32 = 161;
pub(crate) const ERROR_ALREADY_EXISTS: u32 = 183;
pub(crate) const ERROR_FILENAME_EXCED_RANGE: u32 = 206;
pub(crate) const ERROR_DIRECTORY: u32 = 267;
pub(crate) const ERROR_DISK_RESOURCES_EXHAUSTED: u32 = 314;

const TABLE_WINDOWS_ERROR: &[(u32, EnumFsErrorKind)] = &[
    (ERROR_FILE_NOT_FOUND, EnumFsErrorKind::NoSuchFile),
    (ERROR_PATH_NOT_FOUND, EnumFsErrorKind::NoSuchFile),
    (ERROR_INVALID_DRIVE, EnumFsErrorKind::NoSuchFile),
    (ERROR_ACCESS_DENIED, EnumFsErrorKind::PermissionDenied),
    (ERROR_INVALID_ACCESS, EnumFsErrorKind::PermissionDenied),
    (ERROR_FILE_EXISTS, EnumFsErrorKind::AlreadyExists),
    (ERROR_ALREADY_EXISTS, EnumFsErrorKind::AlreadyExists),
    (ERROR_FILENAME_EXCED_RANGE, EnumFsErrorKind::NameTooLong),
    (ERROR_LABEL_TOO_LONG, EnumFsErrorKind::NameTooLong),
    (ERROR_DIRECTORY, EnumFsErrorKind::NotADirectory),
    (ERROR_DISK_FULL, EnumFsErrorKind::DiskFull),
    (ERROR_HANDLE_DISK_FULL, EnumFsErrorKind::DiskFull),
    (ERROR_DISK_RESOURCES_EXHAUSTED, EnumFsErrorKind::DiskFull),
    (ERROR_SHARING_VIOLATION, EnumFsErrorKind::SharingViolation),
    (ERROR_LOCK_VIOLATION, EnumFsErrorKind::SharingViolation),
    (ERROR_NOT_SAME_DEVICE, EnumFsErrorKind::CrossDevice),
    (ERROR_BAD_PATHNAME, EnumFsErrorKind::Unknown),
    (ERROR_INVALID_NAME, EnumFsErrorKind::Unknown),
    (ERROR_WRITE_FAULT, EnumFsErrorKind::Unknown),
    (ERROR_NOT_SUPPORTED, EnumFsErrorKind::Unknown),
    (ERROR_INVALID_PARAMETER, EnumFsErrorKind::Unknown),
];

/// Map a POSIX `errno` value. Codes absent from the table are `Unknown`.
pub fn map_posix_errno(code: i32) -> EnumFsErrorKind {
    TABLE_POSIX_ERRNO
        .iter()
        .find(|(n, _)| *n == code)
        .map(|(_, kind)| *kind)
        .unwrap_or(EnumFsErrorKind::Unknown)
}

/// Map a Win32 error code. Codes absent from the table are `Unknown`.
pub fn map_windows_error(code: u32) -> EnumFsErrorKind {
    TABLE_WINDOWS_ERROR
        .iter()
        .find(|(n, _)| *n == code)
        .map(|(_, kind)| *kind)
        .unwrap_or(EnumFsErrorKind::Unknown)
}

fn map_io_error_kind(kind: io::ErrorKind) -> EnumFsErrorKind {
    match kind {
        io::ErrorKind::NotFound => EnumFsErrorKind::NoSuchFile,
        io::ErrorKind::AlreadyExists => EnumFsErrorKind::AlreadyExists,
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            EnumFsErrorKind::PermissionDenied
        }
        io::ErrorKind::NotADirectory => EnumFsErrorKind::NotADirectory,
        io::ErrorKind::IsADirectory => EnumFsErrorKind::IsADirectory,
        io::ErrorKind::StorageFull => EnumFsErrorKind::DiskFull,
        _ => EnumFsErrorKind::Unknown,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FsError

/// Error returned by every fallible engine call.
#[derive(Debug, Error)]
#[error("{operation} failed ({kind}): {}", .path.display())]
pub struct FsError {
    kind: EnumFsErrorKind,
    operation: EnumFsOperation,
    path: PathBuf,
    host_code: Option<HostErrorCode>,
    #[source]
    source: Option<io::Error>,
}

impl FsError {
    /// Error with no host cause.
    pub fn new(kind: EnumFsErrorKind, operation: EnumFsOperation, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            operation,
            path: path.into(),
            host_code: None,
            source: None,
        }
    }

    /// Map a host I/O error for `path`.
    pub fn from_io(err: io::Error, operation: EnumFsOperation, path: impl Into<PathBuf>) -> Self {
        let host_code = HostErrorCode::from_io(&err);
        let kind = match host_code {
            Some(code) => match code.kind() {
                EnumFsErrorKind::Unknown => map_io_error_kind(err.kind()),
                kind => kind,
            },
            None => map_io_error_kind(err.kind()),
        };
        Self {
            kind,
            operation,
            path: path.into(),
            host_code,
            source: Some(err),
        }
    }

    /// Attach a synthesized host code (used when a check precedes the syscall).
    pub fn with_host_code(mut self, host_code: HostErrorCode) -> Self {
        self.host_code = Some(host_code);
        self
    }

    pub fn kind(&self) -> EnumFsErrorKind {
        self.kind
    }

    pub fn operation(&self) -> EnumFsOperation {
        self.operation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Originating host code, when the failure came from the OS.
    pub fn host_code(&self) -> Option<HostErrorCode> {
        self.host_code
    }

    pub fn io_error(&self) -> Option<&io::Error> {
        self.source.as_ref()
    }

    pub(crate) fn already_exists(path: impl Into<PathBuf>) -> Self {
        let err = Self::new(EnumFsErrorKind::AlreadyExists, EnumFsOperation::Write, path);
        #[cfg(unix)]
        let err = err.with_host_code(HostErrorCode::Posix(libc::EEXIST));
        #[cfg(windows)]
        let err = err.with_host_code(HostErrorCode::Windows(ERROR_ALREADY_EXISTS));
        err
    }

    /// Item kind the operation cannot handle, such as a socket in copy mode.
    pub(crate) fn unsupported(operation: EnumFsOperation, path: impl Into<PathBuf>) -> Self {
        let err = Self::new(EnumFsErrorKind::Unknown, operation, path);
        #[cfg(unix)]
        let err = err.with_host_code(HostErrorCode::Posix(libc::ENOTSUP));
        #[cfg(windows)]
        let err = err.with_host_code(HostErrorCode::Windows(ERROR_NOT_SUPPORTED));
        err
    }

    pub(crate) fn invalid_argument(operation: EnumFsOperation, path: impl Into<PathBuf>) -> Self {
        let err = Self::new(EnumFsErrorKind::Unknown, operation, path);
        #[cfg(unix)]
        let err = err.with_host_code(HostErrorCode::Posix(libc::EINVAL));
        #[cfg(windows)]
        let err = err.with_host_code(HostErrorCode::Windows(ERROR_INVALID_PARAMETER));
        err
    }
}

/// Result alias for engine calls.
pub type FsResult<T> = Result<T, FsError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
