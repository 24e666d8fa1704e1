use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pyo3::exceptions::{
    PyFileExistsError, PyFileNotFoundError, PyIsADirectoryError, PyNotADirectoryError, PyOSError,
    PyPermissionError, PyValueError,
};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict, PyTuple};
use treekit_fs::{
    AttributeValue, EnumAttributeKey, EnumFsErrorKind, FileManager, FileManagerDelegate, FsError,
    ItemAttributes, SearchPathDirectory, SearchPathDomainMask, Timestamp,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "treekit.fs.file_manager.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn map_fs_error(exception: &FsError) -> PyErr {
    let message = exception.to_string();
    match exception.kind() {
        EnumFsErrorKind::NoSuchFile => PyFileNotFoundError::new_err(message),
        EnumFsErrorKind::AlreadyExists => PyFileExistsError::new_err(message),
        EnumFsErrorKind::PermissionDenied => PyPermissionError::new_err(message),
        EnumFsErrorKind::NotADirectory => PyNotADirectoryError::new_err(message),
        EnumFsErrorKind::IsADirectory => PyIsADirectoryError::new_err(message),
        _ => PyOSError::new_err(message),
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region Delegate

/// Forwards hooks to a Python object. Missing methods keep the default
/// answer; a raising method is reported as unraisable and keeps it too.
struct PyDelegate {
    obj: Py<PyAny>,
}

impl PyDelegate {
    fn call_hook<F>(&self, name: &str, b_default: bool, build_args: F) -> bool
    where
        F: for<'py> FnOnce(Python<'py>) -> PyResult<Bound<'py, PyTuple>>,
    {
        Python::with_gil(|py| {
            let obj = self.obj.bind(py);
            if !obj.hasattr(name).unwrap_or(false) {
                return b_default;
            }
            let res = build_args(py)
                .and_then(|args| obj.call_method1(name, args))
                .and_then(|ret| ret.is_truthy());
            match res {
                Ok(b_answer) => b_answer,
                Err(err) => {
                    err.write_unraisable(py, Some(obj));
                    b_default
                }
            }
        })
    }

    fn ask_pair(&self, name: &str, src: &Path, dst: &Path) -> bool {
        self.call_hook(name, true, |py| {
            PyTuple::new(py, [path_str(src), path_str(dst)])
        })
    }

    fn recover_pair(&self, name: &str, err: &FsError, src: &Path, dst: &Path) -> bool {
        self.call_hook(name, false, |py| {
            let exc = map_fs_error(err).value(py).clone().into_any();
            (exc, path_str(src), path_str(dst)).into_pyobject(py)
        })
    }
}

impl FileManagerDelegate for PyDelegate {
    fn should_copy(&self, src: &Path, dst: &Path) -> bool {
        self.ask_pair("should_copy", src, dst)
    }

    fn should_proceed_after_copy_error(&self, err: &FsError, src: &Path, dst: &Path) -> bool {
        self.recover_pair("should_proceed_after_copy_error", err, src, dst)
    }

    fn should_move(&self, src: &Path, dst: &Path) -> bool {
        self.ask_pair("should_move", src, dst)
    }

    fn should_proceed_after_move_error(&self, err: &FsError, src: &Path, dst: &Path) -> bool {
        self.recover_pair("should_proceed_after_move_error", err, src, dst)
    }

    fn should_link(&self, src: &Path, dst: &Path) -> bool {
        self.ask_pair("should_link", src, dst)
    }

    fn should_proceed_after_link_error(&self, err: &FsError, src: &Path, dst: &Path) -> bool {
        self.recover_pair("should_proceed_after_link_error", err, src, dst)
    }

    fn should_remove(&self, path: &Path) -> bool {
        self.call_hook("should_remove", true, |py| PyTuple::new(py, [path_str(path)]))
    }

    fn should_proceed_after_remove_error(&self, err: &FsError, path: &Path) -> bool {
        self.call_hook("should_proceed_after_remove_error", false, |py| {
            let exc = map_fs_error(err).value(py).clone().into_any();
            (exc, path_str(path)).into_pyobject(py)
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Attributes

fn attributes_to_dict<'py>(
    py: Python<'py>,
    attrs: &ItemAttributes,
) -> PyResult<Bound<'py, PyDict>> {
    let dict_attrs = PyDict::new(py);
    for (key, value) in attrs.iter() {
        let key = key.as_str();
        match value {
            AttributeValue::Unsigned(v) => dict_attrs.set_item(key, *v)?,
            AttributeValue::Integer(v) => dict_attrs.set_item(key, *v)?,
            AttributeValue::Float(v) => dict_attrs.set_item(key, *v)?,
            AttributeValue::Bool(v) => dict_attrs.set_item(key, *v)?,
            AttributeValue::Date(v) => dict_attrs.set_item(key, v.as_unix_seconds())?,
            AttributeValue::Type(v) => dict_attrs.set_item(key, v.as_str())?,
            AttributeValue::Bytes(dict_bytes) => {
                let dict_xattrs = PyDict::new(py);
                for (name, data) in dict_bytes {
                    dict_xattrs.set_item(name, PyBytes::new(py, data))?;
                }
                dict_attrs.set_item(key, dict_xattrs)?;
            }
        }
    }
    Ok(dict_attrs)
}

fn parse_attribute_value(
    key: EnumAttributeKey,
    value: &Bound<'_, PyAny>,
) -> PyResult<AttributeValue> {
    Ok(match key {
        EnumAttributeKey::ModificationDate
        | EnumAttributeKey::AccessDate
        | EnumAttributeKey::CreationDate => {
            AttributeValue::Date(Timestamp::from_unix_seconds(value.extract::<f64>()?))
        }
        EnumAttributeKey::Immutable | EnumAttributeKey::AppendOnly => {
            AttributeValue::Bool(value.extract::<bool>()?)
        }
        EnumAttributeKey::ExtendedAttributes => {
            AttributeValue::Bytes(value.extract::<BTreeMap<String, Vec<u8>>>()?)
        }
        _ => match value.extract::<u64>() {
            Ok(v) => AttributeValue::Unsigned(v),
            Err(_) => AttributeValue::Integer(value.extract::<i64>()?),
        },
    })
}

fn parse_attributes(dict_attrs: &Bound<'_, PyDict>) -> PyResult<ItemAttributes> {
    let mut attrs = ItemAttributes::new();
    for (key, value) in dict_attrs.iter() {
        let c_key: String = key.extract()?;
        let key = c_key.parse::<EnumAttributeKey>().map_err(PyValueError::new_err)?;
        attrs.insert(key, parse_attribute_value(key, &value)?);
    }
    Ok(attrs)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileManager

#[pyclass(name = "FileManager")]
struct PyFileManager {
    inner: FileManager,
}

#[pymethods]
impl PyFileManager {
    #[new]
    #[pyo3(signature = (cwd = None, delegate = None))]
    fn new(cwd: Option<String>, delegate: Option<Py<PyAny>>) -> PyResult<Self> {
        let fm = match cwd {
            Some(cwd) => FileManager::with_cwd(cwd),
            None => FileManager::new(),
        }
        .map_err(|e| map_fs_error(&e))?;
        let fm = match delegate {
            Some(obj) => fm.with_delegate(Arc::new(PyDelegate { obj })),
            None => fm,
        };
        Ok(Self { inner: fm })
    }

    fn copy_item(&self, py: Python<'_>, src: String, dst: String) -> PyResult<()> {
        py.allow_threads(|| self.inner.copy_item(&src, &dst))
            .map_err(|e| map_fs_error(&e))
    }

    fn move_item(&self, py: Python<'_>, src: String, dst: String) -> PyResult<()> {
        py.allow_threads(|| self.inner.move_item(&src, &dst))
            .map_err(|e| map_fs_error(&e))
    }

    fn link_item(&self, py: Python<'_>, src: String, dst: String) -> PyResult<()> {
        py.allow_threads(|| self.inner.link_item(&src, &dst))
            .map_err(|e| map_fs_error(&e))
    }

    fn remove_item(&self, py: Python<'_>, path: String) -> PyResult<()> {
        py.allow_threads(|| self.inner.remove_item(&path))
            .map_err(|e| map_fs_error(&e))
    }

    #[pyo3(signature = (path, if_create_intermediates = false, attributes = None))]
    fn create_directory(
        &self,
        path: String,
        if_create_intermediates: bool,
        attributes: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<()> {
        let attrs = attributes.map(parse_attributes).transpose()?;
        self.inner
            .create_directory(&path, if_create_intermediates, attrs.as_ref())
            .map_err(|e| map_fs_error(&e))
    }

    #[pyo3(signature = (path, contents, attributes = None))]
    fn create_file(
        &self,
        path: String,
        contents: Vec<u8>,
        attributes: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<()> {
        let attrs = attributes.map(parse_attributes).transpose()?;
        self.inner
            .create_file(&path, &contents, attrs.as_ref())
            .map_err(|e| map_fs_error(&e))
    }

    fn contents<'py>(&self, py: Python<'py>, path: String) -> Option<Bound<'py, PyBytes>> {
        self.inner
            .contents(&path)
            .map(|data| PyBytes::new(py, &data))
    }

    fn contents_equal(&self, py: Python<'_>, path_a: String, path_b: String) -> bool {
        py.allow_threads(|| self.inner.contents_equal(&path_a, &path_b))
    }

    fn contents_of_directory(&self, path: String) -> PyResult<Vec<String>> {
        self.inner
            .contents_of_directory(&path)
            .map_err(|e| map_fs_error(&e))
    }

    fn subpaths_of_directory(&self, py: Python<'_>, path: String) -> PyResult<Vec<String>> {
        py.allow_threads(|| self.inner.subpaths_of_directory(&path))
            .map_err(|e| map_fs_error(&e))
    }

    fn file_exists(&self, path: String) -> bool {
        self.inner.file_exists(&path)
    }

    fn file_exists_is_directory(&self, path: String) -> Option<bool> {
        self.inner.file_exists_is_directory(&path)
    }

    fn is_readable_file(&self, path: String) -> bool {
        self.inner.is_readable_file(&path)
    }

    fn is_writable_file(&self, path: String) -> bool {
        self.inner.is_writable_file(&path)
    }

    fn is_executable_file(&self, path: String) -> bool {
        self.inner.is_executable_file(&path)
    }

    fn is_deletable_file(&self, path: String) -> bool {
        self.inner.is_deletable_file(&path)
    }

    fn attributes_of_item<'py>(&self, py: Python<'py>, path: String) -> PyResult<Bound<'py, PyDict>> {
        let attrs = self
            .inner
            .attributes_of_item(&path)
            .map_err(|e| map_fs_error(&e))?;
        attributes_to_dict(py, &attrs)
    }

    fn attributes_of_file_system<'py>(
        &self,
        py: Python<'py>,
        path: String,
    ) -> PyResult<Bound<'py, PyDict>> {
        let attrs = self
            .inner
            .attributes_of_file_system(&path)
            .map_err(|e| map_fs_error(&e))?;
        attributes_to_dict(py, &attrs)
    }

    fn set_attributes(&self, attributes: &Bound<'_, PyDict>, path: String) -> PyResult<()> {
        let attrs = parse_attributes(attributes)?;
        self.inner
            .set_attributes(&attrs, &path)
            .map_err(|e| map_fs_error(&e))
    }

    fn create_symbolic_link(&self, path: String, destination: String) -> PyResult<()> {
        self.inner
            .create_symbolic_link(&path, &destination)
            .map_err(|e| map_fs_error(&e))
    }

    fn destination_of_symbolic_link(&self, path: String) -> PyResult<String> {
        self.inner
            .destination_of_symbolic_link(&path)
            .map(|p| path_str(&p))
            .map_err(|e| map_fs_error(&e))
    }

    fn resolving_symlinks_in_path(&self, path: String) -> PyResult<String> {
        self.inner
            .resolving_symlinks_in_path(&path)
            .map(|p| path_str(&p))
            .map_err(|e| map_fs_error(&e))
    }

    fn standardizing_path(&self, path: String) -> String {
        path_str(&self.inner.standardizing_path(&path))
    }

    #[getter]
    fn current_directory_path(&self) -> String {
        path_str(&self.inner.current_directory_path())
    }

    fn change_current_directory_path(&self, path: String) -> bool {
        self.inner.change_current_directory_path(&path)
    }

    fn home_directory(&self) -> Option<String> {
        self.inner.home_directory().map(|p| path_str(&p))
    }

    #[pyo3(signature = (directory, domain_mask = SearchPathDomainMask::USER.bits()))]
    fn urls(&self, directory: &str, domain_mask: u32) -> PyResult<Vec<String>> {
        let directory = directory
            .parse::<SearchPathDirectory>()
            .map_err(PyValueError::new_err)?;
        Ok(self
            .inner
            .urls(directory, SearchPathDomainMask::from_bits(domain_mask))
            .iter()
            .map(|p: &PathBuf| path_str(p))
            .collect())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[pymodule]
fn _treekit_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyFileManager>()?;
    module.add("DOMAIN_USER", SearchPathDomainMask::USER.bits())?;
    module.add("DOMAIN_LOCAL", SearchPathDomainMask::LOCAL.bits())?;
    module.add("DOMAIN_NETWORK", SearchPathDomainMask::NETWORK.bits())?;
    module.add("DOMAIN_SYSTEM", SearchPathDomainMask::SYSTEM.bits())?;
    module.add("DOMAIN_ALL", SearchPathDomainMask::ALL.bits())?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
