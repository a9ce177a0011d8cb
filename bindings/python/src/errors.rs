// bindings/python/src/errors.rs
use matrus_bridge::Error;
use pyo3::exceptions::{
    PyAttributeError, PyMemoryError, PyRuntimeError, PyTypeError, PyValueError,
};
use pyo3::PyErr;

/// Map a bridge error onto the Python exception the caller would expect.
pub fn to_py_err(err: Error) -> PyErr {
    let msg = err.to_string();
    match err {
        Error::NoMatchingOverload { .. }
        | Error::ArgumentType { .. }
        | Error::ArgumentCount { .. } => PyTypeError::new_err(msg),
        Error::UnknownMethod { .. } | Error::UnknownFunction(_) | Error::UnknownClass(_) => {
            PyAttributeError::new_err(msg)
        }
        Error::Core(matrus_core::Error::OutOfMemory { .. }) => PyMemoryError::new_err(msg),
        Error::Core(_) | Error::Solve(_) | Error::ArgumentShape { .. } => {
            PyValueError::new_err(msg)
        }
        _ => PyRuntimeError::new_err(msg),
    }
}
