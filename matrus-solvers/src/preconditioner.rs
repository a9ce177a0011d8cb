//! The preconditioner contract shared by every variant.

use nalgebra::{DMatrix, DVector, RealField};

use crate::error::Result;
use crate::info::ComputationInfo;

/// An operator approximating `A^-1`.
///
/// The lifecycle is: construct (default or from `A`), `compute` to
/// (re)initialise from a matrix, then `solve` any number of times. What
/// `solve` and `info` return before the first `compute` is defined by each
/// implementation.
pub trait Preconditioner<T: RealField + Copy>: Default {
    /// Initialise from `a`, returning `self` for chaining.
    fn compute(&mut self, a: &DMatrix<T>) -> &mut Self;

    /// Approximate solve of `A z = b`.
    fn solve(&self, b: &DVector<T>) -> Result<DVector<T>>;

    /// Whether initialisation from the last matrix succeeded.
    fn info(&self) -> ComputationInfo;

    /// Construct and initialise in one step.
    fn from_matrix(a: &DMatrix<T>) -> Self {
        let mut p = Self::default();
        p.compute(a);
        p
    }
}
