//! # Matrus Bridge
//!
//! Marshalling between nalgebra matrices and strided, type-tagged host
//! arrays (numpy's memory model), plus the exposure of the preconditioner
//! family to a host runtime.
//!
//! - **Outbound** ([`outbound`]): any owned matrix becomes a fresh 2-D
//!   row-major [`HostArray`]. Vectors go out as `(n, 1)` / `(1, n)`.
//! - **Inbound** ([`inbound`]): a two-phase protocol. [`inbound::check`]
//!   inspects an [`ArrayDescriptor`] (rank, type code, alignment) without
//!   side effects; [`inbound::construct_into`] builds the matrix in a
//!   caller-provided [`ConversionSlot`], honouring arbitrary strides.
//! - **Registry** ([`registry`]): the process-wide converter table.
//! - **Exposure** ([`exposure`]): classes composed from capability sets,
//!   dispatched by name.
//! - **Module** ([`module`]): overloaded functions tried in order, the way
//!   the host resolves them.
//!
//! ```
//! use matrus_bridge::{init, BridgeConfig, HostArray, HostValue};
//!
//! let module = init(BridgeConfig::default().with_seed(1)).unwrap();
//! let a: HostValue = HostArray::from_row_major(&[2, 2], &[4.0f64, 0.0, 0.0, 2.0])
//!     .unwrap()
//!     .into();
//! let p = module.instantiate("DiagonalPreconditioner", &[a]).unwrap();
//! let p = p.as_instance().unwrap();
//! let b: HostValue = HostArray::from_row_major(&[2, 1], &[8.0f64, 2.0]).unwrap().into();
//! let x = module.call_method(p, "solve", &[b]).unwrap();
//! assert_eq!(x.as_array().unwrap().to_vec::<f64>(), Some(vec![2.0, 1.0]));
//! ```

use std::sync::OnceLock;

use tracing::info;

pub mod config;
pub mod descriptor;
pub mod error;
pub mod exposure;
pub mod functions;
pub mod host;
pub mod inbound;
pub mod module;
pub mod native;
pub mod outbound;
pub mod registry;

pub use config::{BridgeConfig, ReregisterPolicy};
pub use descriptor::ArrayDescriptor;
pub use error::{Error, Rejection, Result};
pub use exposure::{ClassDescriptor, Instance, PreconditionerState};
pub use host::{HostArray, HostValue};
pub use inbound::{ConversionSlot, ConversionToken};
pub use module::{Module, Overload};
pub use native::NativeMatrix;
pub use registry::{ConversionRegistry, Direction, RegistryBuilder};

static MODULE: OnceLock<Module<'static>> = OnceLock::new();

/// Initialize the binding layer: conversion registry first, then the
/// module's functions and classes.
///
/// Idempotent: later calls return the module built by the first one and
/// ignore their configuration.
pub fn init(config: BridgeConfig) -> Result<&'static Module<'static>> {
    if let Some(module) = MODULE.get() {
        return Ok(module);
    }
    let registry = registry::initialize(&config)?;
    let module = functions::build_module(&config, registry)?;
    let module = MODULE.get_or_init(|| module);
    info!(
        module = module.name(),
        functions = module.functions().len(),
        classes = module.classes().len(),
        "module initialized"
    );
    Ok(module)
}
