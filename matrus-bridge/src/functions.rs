//! Smoke-test functions of the `_matrus` module and the module layout.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use parking_lot::Mutex;
use tracing::info;

use matrus_core::{Element, SplitMix64};

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::exposure::preconditioner_classes;
use crate::module::{Module, Overload};
use crate::registry::ConversionRegistry;

/// 3×6 matrix with entries uniform in `[-1, 1)`.
pub fn random_matrix(rng: &mut SplitMix64) -> DMatrix<f64> {
    DMatrix::from_fn(3, 6, |_, _| rng.next_signed_unit())
}

/// 6-vector with entries uniform in `[-1, 1)`.
pub fn random_vector(rng: &mut SplitMix64) -> DVector<f64> {
    DVector::from_fn(6, |_, _| rng.next_signed_unit())
}

pub fn print_matrix(m: &DMatrix<f64>) {
    info!(target: "matrus::print", "{}", m);
}

pub fn transpose_matrix(m: &DMatrix<f64>) -> DMatrix<f64> {
    m.transpose()
}

fn echo_matrix<T: Element>(m: &DMatrix<T>) -> DMatrix<T> {
    m.clone()
}

/// Lay out the module: functions first, then the preconditioner classes.
pub fn build_module<'r>(config: &BridgeConfig, registry: &'r ConversionRegistry) -> Result<Module<'r>> {
    let rng = Arc::new(Mutex::new(match config.seed {
        Some(seed) => SplitMix64::new(seed),
        None => SplitMix64::from_time(),
    }));
    let matrix_rng = Arc::clone(&rng);
    let vector_rng = rng;

    let mut builder = Module::builder(config.module_name.clone(), registry)
        .def(
            "random_matrix",
            "Returns a random 3x6 matrix.",
            Overload::nullary(move || random_matrix(&mut matrix_rng.lock())),
        )
        .def(
            "random_vector",
            "Returns a random 6-vector as a (6, 1) array.",
            Overload::nullary(move || random_vector(&mut vector_rng.lock())),
        )
        .def(
            "print_matrix",
            "Logs a float64 matrix.",
            Overload::unary(print_matrix),
        )
        .def(
            "echo_matrix",
            "Returns its argument after a round trip through native storage.",
            Overload::unary(echo_matrix::<f64>),
        )
        .def("echo_matrix", "", Overload::unary(echo_matrix::<f32>))
        .def("echo_matrix", "", Overload::unary(echo_matrix::<i32>))
        .def(
            "transpose_matrix",
            "Returns the transpose of a float64 matrix.",
            Overload::unary(transpose_matrix),
        );

    for class in preconditioner_classes()? {
        builder = builder.class(class);
    }
    Ok(builder.build())
}
