//! Error types for matrus-solvers

use thiserror::Error;

/// Result type alias using matrus-solvers' Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when applying a preconditioner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Right-hand side length does not match the preconditioner size
    #[error("Dimension mismatch: preconditioner has size {expected}, right-hand side has {got}")]
    DimensionMismatch {
        /// Preconditioner size
        expected: usize,
        /// Length of `b`
        got: usize,
    },
}
