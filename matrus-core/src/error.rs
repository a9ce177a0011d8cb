//! Error types for matrus-core

use thiserror::Error;

/// Result type alias using matrus-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while allocating or describing host buffers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The allocator could not provide the requested region
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// A shape/stride combination that cannot describe a buffer
    #[error("Invalid shape {shape:?}: {reason}")]
    InvalidShape {
        /// Offending extents
        shape: Vec<usize>,
        /// Why the shape was refused
        reason: &'static str,
    },
}
