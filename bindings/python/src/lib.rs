// bindings/python/src/lib.rs

#![allow(non_local_definitions)]

use std::env;

use matrus_bridge::{BridgeConfig, Module};
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod convert;
mod errors;
mod functions;
mod preconditioner;

use functions::*;
use preconditioner::{
    PyBoundMethod, PyDiagonalPreconditioner, PyIdentityPreconditioner,
    PyLeastSquareDiagonalPreconditioner, PyPreconditioner,
};

/// Environment variable holding the log level (`error` ... `trace`).
const LOG_ENV: &str = "MATRUS_LOG";

/// The bridge module, initialized on first use.
pub(crate) fn module() -> PyResult<&'static Module<'static>> {
    matrus_bridge::init(BridgeConfig::from_env()).map_err(errors::to_py_err)
}

fn init_logging() {
    let level = env::var(LOG_ENV)
        .ok()
        .and_then(|v| v.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    // The host process may already have a subscriber installed.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[pymodule]
fn _matrus(_py: Python, m: &PyModule) -> PyResult<()> {
    init_logging();
    module()?;

    // Preconditioner classes
    m.add_class::<PyPreconditioner>()?;
    m.add_class::<PyBoundMethod>()?;
    m.add_class::<PyDiagonalPreconditioner>()?;
    m.add_class::<PyLeastSquareDiagonalPreconditioner>()?;
    m.add_class::<PyIdentityPreconditioner>()?;

    // Smoke-test functions
    m.add_function(wrap_pyfunction!(random_matrix, m)?)?;
    m.add_function(wrap_pyfunction!(random_vector, m)?)?;
    m.add_function(wrap_pyfunction!(print_matrix, m)?)?;
    m.add_function(wrap_pyfunction!(echo_matrix, m)?)?;
    m.add_function(wrap_pyfunction!(transpose_matrix, m)?)?;

    Ok(())
}
