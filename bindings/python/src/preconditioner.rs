// bindings/python/src/preconditioner.rs
use std::sync::Arc;

use matrus_bridge::{HostValue, Instance};
use pyo3::exceptions::PyAttributeError;
use pyo3::prelude::*;
use pyo3::types::PyTuple;

use crate::convert::{to_host_values, to_py};
use crate::errors::to_py_err;
use crate::module;

/// Common base of the exposed preconditioners. Attribute lookup goes
/// through the instance's class descriptor.
#[pyclass(module = "_matrus", subclass, name = "Preconditioner")]
pub struct PyPreconditioner {
    pub(crate) inner: Arc<Instance>,
}

impl PyPreconditioner {
    fn construct(class: &str, args: &PyTuple) -> PyResult<Self> {
        let module = module()?;
        let values = to_host_values(args)?;
        let inner = module
            .class(class)
            .and_then(|c| c.instantiate(module.registry(), &values))
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }
}

#[pymethods]
impl PyPreconditioner {
    fn __getattr__(slf: &PyCell<Self>, name: &str) -> PyResult<PyBoundMethod> {
        let this = slf.borrow();
        let class = this.inner.class();
        match class.method(name) {
            Some(method) => Ok(PyBoundMethod {
                owner: slf.into(),
                instance: Arc::clone(&this.inner),
                name: method.name,
                doc: method.doc,
            }),
            None => Err(PyAttributeError::new_err(format!(
                "'{}' object has no attribute '{}'",
                class.name(),
                name
            ))),
        }
    }

    fn __dir__(&self) -> Vec<&'static str> {
        self.inner.class().method_names()
    }

    fn __repr__(&self) -> String {
        format!("<_matrus.{} object>", self.inner.class_name())
    }
}

/// A method looked up on a preconditioner, ready to be called.
#[pyclass(module = "_matrus", name = "BoundMethod")]
pub struct PyBoundMethod {
    owner: Py<PyPreconditioner>,
    instance: Arc<Instance>,
    name: &'static str,
    doc: &'static str,
}

#[pymethods]
impl PyBoundMethod {
    #[pyo3(signature = (*args))]
    fn __call__(&self, py: Python<'_>, args: &PyTuple) -> PyResult<PyObject> {
        let module = module()?;
        let values = to_host_values(args)?;
        let ret = self
            .instance
            .call(module.registry(), self.name, &values)
            .map_err(to_py_err)?;
        match ret {
            HostValue::Object(inst) if Arc::ptr_eq(&inst, &self.instance) => {
                Ok(self.owner.clone_ref(py).into_py(py))
            }
            other => to_py(py, other),
        }
    }

    /// Documentation of the underlying method.
    #[getter]
    fn doc(&self) -> &'static str {
        self.doc
    }

    fn __repr__(&self) -> String {
        format!(
            "<bound method {}.{}>",
            self.instance.class_name(),
            self.name
        )
    }
}

macro_rules! preconditioner_class {
    ($rust:ident, $name:literal) => {
        #[pyclass(extends = PyPreconditioner, module = "_matrus", name = $name)]
        pub struct $rust;

        #[pymethods]
        impl $rust {
            #[new]
            #[pyo3(signature = (*args))]
            fn new(args: &PyTuple) -> PyResult<(Self, PyPreconditioner)> {
                Ok(($rust, PyPreconditioner::construct($name, args)?))
            }
        }
    };
}

preconditioner_class!(PyDiagonalPreconditioner, "DiagonalPreconditioner");
preconditioner_class!(
    PyLeastSquareDiagonalPreconditioner,
    "LeastSquareDiagonalPreconditioner"
);
preconditioner_class!(PyIdentityPreconditioner, "IdentityPreconditioner");
