//! `treekit_fs` v1:
//! Rust-side filesystem tree operation engine.
//!
//! Layout:
//! - `manager`     : public facade bound to a working-directory context
//! - `copy`        : copy / hard-link tree walk
//! - `remove`      : recursive removal with per-item delegate consent
//! - `relocate`    : move with cross-device fallback
//! - `compare`     : structural content comparison
//! - `attributes`  : attribute dictionary <-> host metadata
//! - `path`        : standardization and symlink resolution
//! - `search_path` : well-known directories per platform
//! - `delegate`    : per-item consent and error-recovery hooks
//! - `record`      : recording delegate and call report
//! - `error`       : host error mapping
//! - `spec`        : attribute keys, values and file types

mod attributes;
mod compare;
pub mod context;
mod copy;
pub mod delegate;
pub mod error;
pub mod manager;
pub mod path;
pub mod record;
mod relocate;
mod remove;
pub mod search_path;
pub mod spec;
mod util;

pub use context::FileContext;
pub use delegate::FileManagerDelegate;
pub use error::{
    EnumFsErrorKind, EnumFsOperation, FsError, FsResult, HostErrorCode, map_posix_errno,
    map_windows_error,
};
pub use manager::FileManager;
pub use path::AutomountAliasTable;
pub use record::{
    EnumDelegateOperation, RecordingDelegate, ReportDelegateCalls, SpecErrorOperation,
    SpecOperation,
};
pub use search_path::{
    DarwinSearchPaths, EnvSource, ProcessEnv, SearchPathDirectory, SearchPathDomainMask,
    SearchPathProvider, WindowsSearchPaths, XdgSearchPaths, host_search_paths,
};
pub use spec::{AttributeValue, EnumAttributeKey, EnumFileType, ItemAttributes, Timestamp};
