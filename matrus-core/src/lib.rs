//! # Matrus Core
//!
//! Shared primitives for the matrus ecosystem.
//!
//! This crate provides:
//! - **Type codes**: the host array element tags and the `Element` trait that
//!   maps every supported native scalar onto exactly one of them.
//! - **Layout**: row-major / column-major index arithmetic and byte-to-element
//!   stride conversion.
//! - **Aligned buffers**: 64-byte aligned, zero-initialised host allocations
//!   that report allocation failure instead of aborting.
//! - **SplitMix64**: deterministic PRNG for smoke-test data.

pub mod buffer;
pub mod dtype;
pub mod error;
pub mod layout;
pub mod rng;

pub use buffer::{AlignedBuffer, ALIGNMENT};
pub use dtype::{type_code_for, Element, TypeCode};
pub use error::{Error, Result};
pub use layout::{element_strides, row_major_byte_strides, Layout};
pub use rng::SplitMix64;
