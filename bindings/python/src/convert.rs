// bindings/python/src/convert.rs
use std::os::raw::c_int;

use matrus_bridge::{ArrayDescriptor, HostArray, HostValue};
use matrus_core::{Element, TypeCode};
use numpy::{PyArray1, PyUntypedArray};
use pyo3::exceptions::{PyRuntimeError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::PyBool;

use crate::preconditioner::PyPreconditioner;

/// `NPY_ARRAY_ALIGNED` from the numpy C API.
const NPY_ARRAY_ALIGNED: c_int = 0x0100;

/// Header of a numpy array, borrowed for as long as the GIL reference.
pub fn descriptor(array: &PyUntypedArray) -> ArrayDescriptor<'_> {
    let raw = array.as_array_ptr();
    let dtype = array.dtype();
    unsafe {
        let data = (*raw).data as *const u8;
        let aligned = (*raw).flags & NPY_ARRAY_ALIGNED != 0;
        ArrayDescriptor::from_raw_parts(
            dtype.num(),
            dtype.itemsize(),
            array.shape(),
            array.strides(),
            aligned,
            data,
        )
    }
}

/// Python argument -> host value.
pub fn to_host_value(obj: &PyAny) -> PyResult<HostValue<'_>> {
    if obj.is_none() {
        return Ok(HostValue::None);
    }
    if let Ok(array) = obj.downcast::<PyUntypedArray>() {
        return Ok(HostValue::Array(descriptor(array)));
    }
    if let Ok(p) = obj.extract::<PyRef<PyPreconditioner>>() {
        return Ok(HostValue::Object(p.inner.clone()));
    }
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(HostValue::Bool(b.is_true()));
    }
    if let Ok(v) = obj.extract::<i64>() {
        return Ok(HostValue::Int(v));
    }
    if let Ok(v) = obj.extract::<f64>() {
        return Ok(HostValue::Float(v));
    }
    if let Ok(s) = obj.extract::<String>() {
        return Ok(HostValue::Str(s));
    }
    Err(PyTypeError::new_err(format!(
        "unsupported argument type '{}'",
        obj.get_type().name()?
    )))
}

pub fn to_host_values(args: &pyo3::types::PyTuple) -> PyResult<Vec<HostValue<'_>>> {
    args.iter().map(to_host_value).collect()
}

fn typed_array<T: Element + numpy::Element>(py: Python<'_>, array: &HostArray) -> PyResult<PyObject> {
    let data = array
        .to_vec::<T>()
        .ok_or_else(|| PyRuntimeError::new_err("host array dtype changed during conversion"))?;
    let out = PyArray1::from_vec(py, data).reshape(array.shape().to_vec())?;
    Ok(out.to_owned().into_py(py))
}

/// Copy an owned host array into a fresh numpy array of the same dtype and
/// shape.
pub fn array_to_py(py: Python<'_>, array: &HostArray) -> PyResult<PyObject> {
    match array.type_code() {
        TypeCode::Double => typed_array::<f64>(py, array),
        TypeCode::Float => typed_array::<f32>(py, array),
        TypeCode::Int => typed_array::<i32>(py, array),
        other => Err(PyTypeError::new_err(format!(
            "no numpy conversion for dtype {}",
            other
        ))),
    }
}

/// Host value -> Python object. Instances are handled by the caller, which
/// owns the Python wrapper.
pub fn to_py(py: Python<'_>, value: HostValue<'static>) -> PyResult<PyObject> {
    match value {
        HostValue::None => Ok(py.None()),
        HostValue::Bool(b) => Ok(b.into_py(py)),
        HostValue::Int(v) => Ok(v.into_py(py)),
        HostValue::Float(v) => Ok(v.into_py(py)),
        HostValue::Str(s) => Ok(s.into_py(py)),
        HostValue::OwnedArray(array) => array_to_py(py, &array),
        HostValue::Array(_) | HostValue::Object(_) => Err(PyRuntimeError::new_err(
            "borrowed arrays and foreign instances cannot be returned",
        )),
    }
}
