//! Public facade: one [`FileManager`] per working-directory context.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::attributes::{self, EnumAccessMode};
use crate::compare;
use crate::context::FileContext;
use crate::copy::{EnumTreeMode, process_tree};
use crate::delegate::FileManagerDelegate;
use crate::error::{EnumFsErrorKind, EnumFsOperation, FsError, FsResult};
use crate::path::{self as path_resolver, AutomountAliasTable};
use crate::relocate;
use crate::remove;
use crate::search_path::{
    SearchPathDirectory, SearchPathDomainMask, SearchPathProvider, host_search_paths,
};
use crate::spec::ItemAttributes;
use crate::util::{create_symbolic_link, join_slash, read_dir_sorted};

/// Filesystem tree operations resolved against an explicit working directory.
///
/// Relative paths are joined onto the context directory, never onto the
/// process directory. Recursive operations consult the installed
/// [`FileManagerDelegate`] per item.
pub struct FileManager {
    ctx: FileContext,
    delegate: Option<Arc<dyn FileManagerDelegate>>,
    search_paths: Box<dyn SearchPathProvider>,
    aliases: AutomountAliasTable,
}

impl fmt::Debug for FileManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileManager")
            .field("ctx", &self.ctx)
            .field("has_delegate", &self.delegate.is_some())
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

impl FileManager {
    /// Manager rooted at the process directory with host defaults.
    pub fn new() -> FsResult<Self> {
        Ok(Self::with_context(FileContext::from_process()?))
    }

    /// Manager rooted at `cwd`.
    pub fn with_cwd(cwd: impl AsRef<Path>) -> FsResult<Self> {
        Ok(Self::with_context(FileContext::new(cwd)?))
    }

    pub fn with_context(ctx: FileContext) -> Self {
        Self {
            ctx,
            delegate: None,
            search_paths: host_search_paths(),
            aliases: AutomountAliasTable::host(),
        }
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn FileManagerDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn with_search_paths(mut self, provider: impl SearchPathProvider + 'static) -> Self {
        self.search_paths = Box::new(provider);
        self
    }

    pub fn with_aliases(mut self, aliases: AutomountAliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn set_delegate(&mut self, delegate: Option<Arc<dyn FileManagerDelegate>>) {
        self.delegate = delegate;
    }

    pub fn delegate(&self) -> Option<&Arc<dyn FileManagerDelegate>> {
        self.delegate.as_ref()
    }

    pub fn context(&self) -> &FileContext {
        &self.ctx
    }

    fn delegate_ref(&self) -> Option<&dyn FileManagerDelegate> {
        self.delegate.as_deref()
    }

    fn abs(&self, path: &Path) -> PathBuf {
        self.ctx.absolute(path)
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region TreeOperations

    /// Recursively copy `src` to `dst`. Symlinks are copied as links and
    /// existing destinations are never overwritten.
    pub fn copy_item(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> FsResult<()> {
        let (src, dst) = (src.as_ref(), dst.as_ref());
        process_tree(
            EnumTreeMode::Copy,
            &self.abs(src),
            &self.abs(dst),
            src,
            dst,
            self.delegate_ref(),
        )
    }

    /// Recreate `src` at `dst` with files hard-linked instead of copied.
    pub fn link_item(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> FsResult<()> {
        let (src, dst) = (src.as_ref(), dst.as_ref());
        process_tree(
            EnumTreeMode::Link,
            &self.abs(src),
            &self.abs(dst),
            src,
            dst,
            self.delegate_ref(),
        )
    }

    /// Rename `src` to `dst`, copying across volumes when needed.
    pub fn move_item(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> FsResult<()> {
        relocate::move_item(
            &self.abs(src.as_ref()),
            &self.abs(dst.as_ref()),
            self.delegate_ref(),
        )
    }

    /// Remove `path` and, for a directory, everything below it.
    pub fn remove_item(&self, path: impl AsRef<Path>) -> FsResult<()> {
        let path = path.as_ref();
        remove::remove_item(&self.abs(path), path, self.delegate_ref())
    }

    /// Create a directory. Without `b_intermediates` every parent must exist
    /// and any existing item is `AlreadyExists`; with it, parents are created
    /// and an existing directory is accepted.
    pub fn create_directory(
        &self,
        path: impl AsRef<Path>,
        b_intermediates: bool,
        attrs: Option<&ItemAttributes>,
    ) -> FsResult<()> {
        let path = path.as_ref();
        let path_abs = self.abs(path);
        let to_err = |e| FsError::from_io(e, EnumFsOperation::Write, path);

        if b_intermediates {
            match fs::metadata(&path_abs) {
                Ok(meta) if meta.is_dir() => return Ok(()),
                Ok(_) => return Err(FsError::already_exists(path)),
                Err(_) => fs::create_dir_all(&path_abs).map_err(to_err)?,
            }
        } else {
            fs::create_dir(&path_abs).map_err(to_err)?;
        }
        tracing::debug!(target: "treekit_fs::manager", "mkdir {}", path_abs.display());

        match attrs {
            Some(attrs) => attributes::set_attributes(attrs, &path_abs, path),
            None => Ok(()),
        }
    }

    /// Write `contents` to `path`, replacing any existing file.
    pub fn create_file(
        &self,
        path: impl AsRef<Path>,
        contents: &[u8],
        attrs: Option<&ItemAttributes>,
    ) -> FsResult<()> {
        let path = path.as_ref();
        let path_abs = self.abs(path);
        fs::write(&path_abs, contents)
            .map_err(|e| FsError::from_io(e, EnumFsOperation::Write, path))?;
        match attrs {
            Some(attrs) => attributes::set_attributes(attrs, &path_abs, path),
            None => Ok(()),
        }
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        fs::read(self.abs(path.as_ref())).ok()
    }

    /// Recursive structural and byte comparison.
    pub fn contents_equal(&self, path_a: impl AsRef<Path>, path_b: impl AsRef<Path>) -> bool {
        compare::contents_equal(&self.abs(path_a.as_ref()), &self.abs(path_b.as_ref()))
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Listing

    /// Names directly inside `path`, sorted.
    pub fn contents_of_directory(&self, path: impl AsRef<Path>) -> FsResult<Vec<String>> {
        let path = path.as_ref();
        let l_names = read_dir_sorted(&self.abs(path))
            .map_err(|e| FsError::from_io(e, EnumFsOperation::Read, path))?;
        Ok(l_names
            .into_iter()
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }

    /// Every item below `path` as `/`-joined relative paths, pre-order with
    /// siblings sorted. Linked directories are listed but not entered.
    pub fn subpaths_of_directory(&self, path: impl AsRef<Path>) -> FsResult<Vec<String>> {
        let path = path.as_ref();
        let path_abs = self.abs(path);
        let l_names = read_dir_sorted(&path_abs)
            .map_err(|e| FsError::from_io(e, EnumFsOperation::Read, path))?;

        let mut l_subpaths = Vec::new();
        collect_subpaths(&path_abs, "", l_names, &mut l_subpaths);
        Ok(l_subpaths)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Queries

    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        fs::symlink_metadata(self.abs(path.as_ref())).is_ok()
    }

    /// `Some(is_dir)` when the item exists; a link answers for its target.
    pub fn file_exists_is_directory(&self, path: impl AsRef<Path>) -> Option<bool> {
        let path_abs = self.abs(path.as_ref());
        match fs::metadata(&path_abs) {
            Ok(meta) => Some(meta.is_dir()),
            Err(_) => fs::symlink_metadata(&path_abs).ok().map(|_| false),
        }
    }

    pub fn is_readable_file(&self, path: impl AsRef<Path>) -> bool {
        attributes::is_accessible(&self.abs(path.as_ref()), EnumAccessMode::Read)
    }

    pub fn is_writable_file(&self, path: impl AsRef<Path>) -> bool {
        attributes::is_accessible(&self.abs(path.as_ref()), EnumAccessMode::Write)
    }

    pub fn is_executable_file(&self, path: impl AsRef<Path>) -> bool {
        attributes::is_accessible(&self.abs(path.as_ref()), EnumAccessMode::Execute)
    }

    pub fn is_deletable_file(&self, path: impl AsRef<Path>) -> bool {
        attributes::is_deletable(&self.abs(path.as_ref()))
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Attributes

    pub fn attributes_of_item(&self, path: impl AsRef<Path>) -> FsResult<ItemAttributes> {
        let path = path.as_ref();
        attributes::attributes_of_item(&self.abs(path), path)
    }

    pub fn set_attributes(&self, attrs: &ItemAttributes, path: impl AsRef<Path>) -> FsResult<()> {
        let path = path.as_ref();
        attributes::set_attributes(attrs, &self.abs(path), path)
    }

    pub fn attributes_of_file_system(&self, path: impl AsRef<Path>) -> FsResult<ItemAttributes> {
        let path = path.as_ref();
        attributes::attributes_of_file_system(&self.abs(path), path)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Paths

    /// Create a link at `path` storing `destination` verbatim.
    pub fn create_symbolic_link(
        &self,
        path: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> FsResult<()> {
        let (path, destination) = (path.as_ref(), destination.as_ref());
        let path_abs = self.abs(path);
        let path_target = match path_abs.parent() {
            Some(path_parent) => path_parent.join(destination),
            None => destination.to_path_buf(),
        };
        let b_target_is_dir = fs::metadata(path_target).map(|m| m.is_dir()).unwrap_or(false);
        create_symbolic_link(&path_abs, destination, b_target_is_dir)
            .map_err(|e| FsError::from_io(e, EnumFsOperation::Write, path))
    }

    pub fn destination_of_symbolic_link(&self, path: impl AsRef<Path>) -> FsResult<PathBuf> {
        let path = path.as_ref();
        path_resolver::destination_of_symbolic_link(&self.abs(path), path)
    }

    /// Expand every link in `path`, then standardize the result.
    pub fn resolving_symlinks_in_path(&self, path: impl AsRef<Path>) -> FsResult<PathBuf> {
        let path_resolved =
            path_resolver::resolve_symbolic_links(path.as_ref(), &self.ctx.current_directory())?;
        Ok(path_resolver::standardize(&path_resolved, &self.aliases))
    }

    /// Lexical cleanup plus the automount alias table; the filesystem is not
    /// consulted.
    pub fn standardizing_path(&self, path: impl AsRef<Path>) -> PathBuf {
        path_resolver::standardize(path.as_ref(), &self.aliases)
    }

    pub fn current_directory_path(&self) -> PathBuf {
        self.ctx.current_directory()
    }

    pub fn change_current_directory_path(&self, path: impl AsRef<Path>) -> bool {
        self.ctx.change_current_directory(path)
    }

    pub fn home_directory(&self) -> Option<PathBuf> {
        crate::search_path::home_directory()
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region SearchPaths

    pub fn urls(&self, directory: SearchPathDirectory, domain: SearchPathDomainMask) -> Vec<PathBuf> {
        self.search_paths.urls(directory, domain)
    }

    /// First location for `directory`, optionally created on disk.
    pub fn url_for_directory(
        &self,
        directory: SearchPathDirectory,
        domain: SearchPathDomainMask,
        b_create: bool,
    ) -> FsResult<PathBuf> {
        let Some(path) = self.urls(directory, domain).into_iter().next() else {
            return Err(FsError::new(
                EnumFsErrorKind::NoSuchFile,
                EnumFsOperation::Read,
                directory.as_str(),
            ));
        };
        if b_create {
            fs::create_dir_all(&path)
                .map_err(|e| FsError::from_io(e, EnumFsOperation::Write, &path))?;
        }
        Ok(path)
    }

    // #endregion
}

fn collect_subpaths(
    path_dir: &Path,
    prefix: &str,
    l_names: Vec<std::ffi::OsString>,
    l_subpaths: &mut Vec<String>,
) {
    for name in l_names {
        let c_name = name.to_string_lossy();
        let c_subpath = join_slash(prefix, &c_name);
        l_subpaths.push(c_subpath.clone());

        let path_child = path_dir.join(&name);
        let b_is_dir = fs::symlink_metadata(&path_child)
            .map(|m| m.file_type().is_dir())
            .unwrap_or(false);
        if !b_is_dir {
            continue;
        }
        match read_dir_sorted(&path_child) {
            Ok(l_children) => collect_subpaths(&path_child, &c_subpath, l_children, l_subpaths),
            Err(e) => tracing::debug!(
                target: "treekit_fs::manager",
                "not descending into {} ({e})",
                path_child.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use super::*;
    use crate::record::RecordingDelegate;

    fn manager_in(root: &Path) -> FileManager {
        FileManager::with_cwd(root).expect("manager")
    }

    #[test]
    fn subpaths_ignore_spelling_of_cwd() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(tmp.path().join("dir")).expect("mkdir");
        fs::write(tmp.path().join("dir/foo"), b"").expect("write");
        fs::write(tmp.path().join("bar"), b"").expect("write");
        let fm = manager_in(tmp.path());

        let set_expected: BTreeSet<String> =
            ["bar", "dir", "dir/foo"].iter().map(|s| s.to_string()).collect();
        let c_cwd = tmp.path().to_string_lossy().into_owned();
        for spelling in [
            ".".to_string(),
            "./".to_string(),
            ".//".to_string(),
            c_cwd.clone(),
            format!("{c_cwd}/"),
            format!("{c_cwd}//"),
        ] {
            let set_found: BTreeSet<String> = fm
                .subpaths_of_directory(&spelling)
                .expect("subpaths")
                .into_iter()
                .collect();
            assert_eq!(set_found, set_expected, "spelling {spelling:?}");
        }
        assert_eq!(
            fm.subpaths_of_directory(".").expect("subpaths"),
            vec!["bar", "dir", "dir/foo"]
        );
    }

    #[test]
    fn copy_then_remove_source_keeps_random_payloads() {
        use rand::{Rng, SeedableRng};

        let tmp = tempfile::tempdir().expect("tempdir");
        let fm = manager_in(tmp.path());
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x7265_6b69);
        fm.create_directory("src/nested", true, None).expect("mkdir");

        let mut dict_payloads = Vec::new();
        for (idx, c_name) in ["a.bin", "nested/b.bin", "nested/empty.bin"].iter().enumerate() {
            let n_len = if idx == 2 { 0 } else { rng.gen_range(1..200_000) };
            let payload: Vec<u8> = (0..n_len).map(|_| rng.r#gen::<u8>()).collect();
            fm.create_file(format!("src/{c_name}"), &payload, None)
                .expect("create");
            dict_payloads.push((c_name.to_string(), payload));
        }

        fm.copy_item("src", "dst").expect("copy");
        assert!(fm.contents_equal("src", "dst"));
        fm.remove_item("src").expect("remove");
        assert!(!fm.file_exists("src"));
        for (c_name, payload) in dict_payloads {
            assert_eq!(fm.contents(format!("dst/{c_name}")), Some(payload), "{c_name}");
        }
    }

    #[test]
    fn create_directory_flags() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let fm = manager_in(tmp.path());
        fs::write(tmp.path().join("preexisting_file"), b"").expect("write");

        let err = fm.create_directory("a/b", false, None).expect_err("no parent");
        assert_eq!(err.kind(), EnumFsErrorKind::NoSuchFile);
        fm.create_directory("a/b", true, None).expect("intermediates");
        fm.create_directory("a/b", true, None).expect("idempotent");
        let err = fm.create_directory("a/b", false, None).expect_err("exists");
        assert_eq!(err.kind(), EnumFsErrorKind::AlreadyExists);
        for b_intermediates in [false, true] {
            let err = fm
                .create_directory("preexisting_file", b_intermediates, None)
                .expect_err("file in the way");
            assert_eq!(err.kind(), EnumFsErrorKind::AlreadyExists);
        }
    }

    #[test]
    fn contents_of_directory_is_sorted_and_typed_errors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let fm = manager_in(tmp.path());
        fm.create_file("b", b"", None).expect("create");
        fm.create_file("a", b"", None).expect("create");
        assert_eq!(fm.contents_of_directory(".").expect("list"), vec!["a", "b"]);

        let err = fm.contents_of_directory("a").expect_err("file");
        assert_eq!(err.kind(), EnumFsErrorKind::NotADirectory);
        let err = fm.contents_of_directory("nope").expect_err("missing");
        assert_eq!(err.kind(), EnumFsErrorKind::NoSuchFile);
    }

    #[test]
    fn delegate_is_consulted_through_manager() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(tmp.path().join("dir")).expect("mkdir");
        fs::write(tmp.path().join("dir/foo"), b"x").expect("write");
        let delegate = Arc::new(RecordingDelegate::new());
        let fm = manager_in(tmp.path()).with_delegate(delegate.clone());

        fm.copy_item("dir", "dir2").expect("copy");
        assert_eq!(
            delegate.take().pairs(),
            vec![
                (PathBuf::from("dir"), Some(PathBuf::from("dir2"))),
                (PathBuf::from("dir/foo"), Some(PathBuf::from("dir2/foo"))),
            ]
        );

        fm.remove_item("dir2").expect("remove");
        let l_removed: Vec<PathBuf> = delegate.take().calls.into_iter().map(|c| c.src).collect();
        assert_eq!(
            l_removed,
            vec![tmp.path().join("dir2"), tmp.path().join("dir2/foo")]
        );
    }

    #[test]
    fn delegate_can_be_swapped_and_cleared() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut fm = manager_in(tmp.path());
        assert!(fm.delegate().is_none());
        assert_eq!(fm.context().current_directory(), tmp.path());

        let delegate = Arc::new(RecordingDelegate::new().with_authorize(false));
        fm.set_delegate(Some(delegate.clone()));
        assert!(fm.delegate().is_some());
        fm.create_file("f", b"x", None).expect("create");
        fm.remove_item("f").expect("vetoed");
        assert!(fm.file_exists("f"));
        assert_eq!(delegate.take().call_count(), 1);

        fm.set_delegate(None);
        fm.remove_item("f").expect("remove");
        assert!(!fm.file_exists("f"));
        assert_eq!(delegate.report().call_count(), 0);
    }

    #[test]
    fn copy_into_own_subtree_is_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let fm = manager_in(tmp.path());
        fm.create_directory("dir", false, None).expect("mkdir");
        fm.create_file("dir/foo", b"x", None).expect("create");

        for (src, dst) in [("dir", "dir/sub"), ("dir", "./dir/sub/deeper"), ("dir", "dir")] {
            let err = fm.copy_item(src, dst).expect_err("nested copy");
            assert_eq!(err.kind(), EnumFsErrorKind::Unknown, "{src} -> {dst}");
            let err = fm.link_item(src, dst).expect_err("nested link");
            assert_eq!(err.kind(), EnumFsErrorKind::Unknown, "{src} -> {dst}");
        }
        assert_eq!(fm.subpaths_of_directory("dir").expect("subpaths"), vec!["foo"]);

        let delegate = Arc::new(RecordingDelegate::new());
        let fm = fm.with_delegate(delegate.clone());
        fm.copy_item("dir", "dir/sub").expect("recovered");
        assert_eq!(delegate.report().error_count(), 1);
        assert_eq!(fm.subpaths_of_directory("dir").expect("subpaths"), vec!["foo"]);
    }

    #[test]
    fn change_directory_moves_relative_resolution() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let fm = manager_in(tmp.path());
        fm.create_directory("dir", false, None).expect("mkdir");
        fm.create_file("dir/foo", b"payload", None).expect("create");
        fm.create_file("file", b"", None).expect("create");

        assert!(!fm.change_current_directory_path("file"));
        assert!(!fm.change_current_directory_path("missing"));
        assert!(fm.change_current_directory_path("dir"));
        assert_eq!(fm.current_directory_path(), tmp.path().join("dir"));
        assert_eq!(fm.contents("foo"), Some(b"payload".to_vec()));
    }

    #[test]
    fn queries_report_existence_and_kind() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let fm = manager_in(tmp.path());
        fm.create_directory("d", false, None).expect("mkdir");
        fm.create_file("f", b"", None).expect("create");

        assert!(fm.file_exists("f"));
        assert!(!fm.file_exists("nope"));
        assert_eq!(fm.file_exists_is_directory("d"), Some(true));
        assert_eq!(fm.file_exists_is_directory("f"), Some(false));
        assert_eq!(fm.file_exists_is_directory("nope"), None);
        assert!(fm.is_readable_file("f"));
        assert!(fm.is_deletable_file("f"));
    }

    #[cfg(unix)]
    #[test]
    fn symbolic_link_round_trip() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = fs::canonicalize(tmp.path()).expect("canonicalize");
        let fm = manager_in(&root).with_aliases(AutomountAliasTable::empty());
        fm.create_file("destination", b"", None).expect("create");
        fm.create_symbolic_link("link", "destination").expect("symlink");

        assert_eq!(
            fm.destination_of_symbolic_link("link").expect("read"),
            PathBuf::from("destination")
        );
        assert_eq!(
            fm.resolving_symlinks_in_path("link").expect("resolve"),
            root.join("destination")
        );
        let err = fm.create_symbolic_link("link", "other").expect_err("exists");
        assert_eq!(err.kind(), EnumFsErrorKind::AlreadyExists);
    }

    #[test]
    fn url_for_directory_creates_on_request() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut dict_env = std::collections::BTreeMap::new();
        dict_env.insert(
            "XDG_CACHE_HOME".to_string(),
            tmp.path().join("cache").to_string_lossy().into_owned(),
        );
        let fm = manager_in(tmp.path())
            .with_search_paths(crate::search_path::XdgSearchPaths::with_env(dict_env));

        let path = fm
            .url_for_directory(SearchPathDirectory::Caches, SearchPathDomainMask::USER, true)
            .expect("caches");
        assert_eq!(path, tmp.path().join("cache"));
        assert!(path.is_dir());

        let err = fm
            .url_for_directory(
                SearchPathDirectory::ItemReplacement,
                SearchPathDomainMask::ALL,
                false,
            )
            .expect_err("never resolves");
        assert_eq!(err.kind(), EnumFsErrorKind::NoSuchFile);
    }
}
