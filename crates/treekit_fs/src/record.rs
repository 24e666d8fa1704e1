//! Recording delegate and the call report it produces.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::delegate::FileManagerDelegate;
use crate::error::{EnumFsErrorKind, FsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumDelegateOperation {
    Copy,
    Move,
    Link,
    Remove,
}

impl EnumDelegateOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Link => "link",
            Self::Remove => "remove",
        }
    }
}

/// One authorization callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOperation {
    pub op: EnumDelegateOperation,
    pub src: PathBuf,
    /// `None` for remove.
    pub dst: Option<PathBuf>,
}

/// One failure callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecErrorOperation {
    pub op: EnumDelegateOperation,
    pub path: PathBuf,
    pub kind: EnumFsErrorKind,
}

/// Ordered delegate calls observed during one or more engine calls.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportDelegateCalls {
    /// Authorization callbacks in invocation order.
    pub calls: Vec<SpecOperation>,
    /// Failure callbacks in invocation order.
    pub errors: Vec<SpecErrorOperation>,
}

impl ReportDelegateCalls {
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// `(src, dst)` pairs of the authorization callbacks.
    pub fn pairs(&self) -> Vec<(PathBuf, Option<PathBuf>)> {
        self.calls
            .iter()
            .map(|c| (c.src.clone(), c.dst.clone()))
            .collect()
    }

    /// Error kinds of the failure callbacks.
    pub fn error_kinds(&self) -> Vec<EnumFsErrorKind> {
        self.errors.iter().map(|e| e.kind).collect()
    }

    /// Per-operation counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        for call in &self.calls {
            *dict_counts
                .entry(format!("cnt_{}", call.op.as_str()))
                .or_insert(0) += 1;
        }
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts
    }
}

impl fmt::Display for ReportDelegateCalls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[DELEGATE] calls={} errors={}",
            self.call_count(),
            self.error_count()
        )
    }
}

/// Delegate that records every callback and answers with fixed decisions.
#[derive(Debug)]
pub struct RecordingDelegate {
    b_authorize: bool,
    b_recover: bool,
    l_denied: Vec<PathBuf>,
    report: Mutex<ReportDelegateCalls>,
}

impl Default for RecordingDelegate {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDelegate {
    /// Authorizes every item and recovers from every failure.
    pub fn new() -> Self {
        Self {
            b_authorize: true,
            b_recover: true,
            l_denied: Vec::new(),
            report: Mutex::new(ReportDelegateCalls::default()),
        }
    }

    pub fn with_authorize(mut self, b_authorize: bool) -> Self {
        self.b_authorize = b_authorize;
        self
    }

    pub fn with_recover(mut self, b_recover: bool) -> Self {
        self.b_recover = b_recover;
        self
    }

    /// Deny authorization for items whose reported source equals `path`.
    pub fn with_denied(mut self, path: impl Into<PathBuf>) -> Self {
        self.l_denied.push(path.into());
        self
    }

    /// Snapshot of the calls so far.
    pub fn report(&self) -> ReportDelegateCalls {
        self.report.lock().clone()
    }

    /// Drain the calls so far.
    pub fn take(&self) -> ReportDelegateCalls {
        std::mem::take(&mut *self.report.lock())
    }

    fn record(&self, op: EnumDelegateOperation, src: &Path, dst: Option<&Path>) -> bool {
        self.report.lock().calls.push(SpecOperation {
            op,
            src: src.to_path_buf(),
            dst: dst.map(Path::to_path_buf),
        });
        self.b_authorize && !self.l_denied.iter().any(|p| p == src)
    }

    fn record_error(&self, op: EnumDelegateOperation, err: &FsError, path: &Path) -> bool {
        self.report.lock().errors.push(SpecErrorOperation {
            op,
            path: path.to_path_buf(),
            kind: err.kind(),
        });
        self.b_recover
    }
}

impl FileManagerDelegate for RecordingDelegate {
    fn should_copy(&self, src: &Path, dst: &Path) -> bool {
        self.record(EnumDelegateOperation::Copy, src, Some(dst))
    }

    fn should_proceed_after_copy_error(&self, err: &FsError, src: &Path, _dst: &Path) -> bool {
        self.record_error(EnumDelegateOperation::Copy, err, src)
    }

    fn should_move(&self, src: &Path, dst: &Path) -> bool {
        self.record(EnumDelegateOperation::Move, src, Some(dst))
    }

    fn should_proceed_after_move_error(&self, err: &FsError, src: &Path, _dst: &Path) -> bool {
        self.record_error(EnumDelegateOperation::Move, err, src)
    }

    fn should_link(&self, src: &Path, dst: &Path) -> bool {
        self.record(EnumDelegateOperation::Link, src, Some(dst))
    }

    fn should_proceed_after_link_error(&self, err: &FsError, src: &Path, _dst: &Path) -> bool {
        self.record_error(EnumDelegateOperation::Link, err, src)
    }

    fn should_remove(&self, path: &Path) -> bool {
        self.record(EnumDelegateOperation::Remove, path, None)
    }

    fn should_proceed_after_remove_error(&self, err: &FsError, path: &Path) -> bool {
        self.record_error(EnumDelegateOperation::Remove, err, path)
    }
}
