// bindings/python/src/functions.rs
use pyo3::prelude::*;
use pyo3::types::PyTuple;

use crate::convert::{to_host_values, to_py};
use crate::errors::to_py_err;
use crate::module;

/// Resolve `name` among the module's overloads and convert the result.
fn dispatch(py: Python<'_>, name: &str, args: &PyTuple) -> PyResult<PyObject> {
    let module = module()?;
    let values = to_host_values(args)?;
    let ret = module.call(name, &values).map_err(to_py_err)?;
    to_py(py, ret)
}

#[pyfunction]
pub fn random_matrix(py: Python<'_>) -> PyResult<PyObject> {
    dispatch(py, "random_matrix", PyTuple::empty(py))
}

#[pyfunction]
pub fn random_vector(py: Python<'_>) -> PyResult<PyObject> {
    dispatch(py, "random_vector", PyTuple::empty(py))
}

#[pyfunction]
#[pyo3(signature = (*args))]
pub fn print_matrix(py: Python<'_>, args: &PyTuple) -> PyResult<PyObject> {
    dispatch(py, "print_matrix", args)
}

#[pyfunction]
#[pyo3(signature = (*args))]
pub fn echo_matrix(py: Python<'_>, args: &PyTuple) -> PyResult<PyObject> {
    dispatch(py, "echo_matrix", args)
}

#[pyfunction]
#[pyo3(signature = (*args))]
pub fn transpose_matrix(py: Python<'_>, args: &PyTuple) -> PyResult<PyObject> {
    dispatch(py, "transpose_matrix", args)
}
