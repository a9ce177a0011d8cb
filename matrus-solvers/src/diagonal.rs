//! Jacobi preconditioner.

use nalgebra::{DMatrix, DVector, RealField};

use crate::error::{Error, Result};
use crate::info::ComputationInfo;
use crate::preconditioner::Preconditioner;

/// A preconditioner based on the diagonal entries of `A`.
///
/// Approximately solves `A x = b` assuming `A` is diagonal. Zero or missing
/// diagonal entries (columns past the last row of a wide matrix) contribute
/// a factor of one.
///
/// Before the first `compute`, `info()` reports
/// [`ComputationInfo::InvalidInput`] and `solve` returns `b` unchanged.
#[derive(Debug, Clone)]
pub struct DiagonalPreconditioner<T: RealField + Copy> {
    inv_diag: DVector<T>,
    initialized: bool,
}

impl<T: RealField + Copy> Default for DiagonalPreconditioner<T> {
    fn default() -> Self {
        Self {
            inv_diag: DVector::zeros(0),
            initialized: false,
        }
    }
}

impl<T: RealField + Copy> DiagonalPreconditioner<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the preconditioner (number of columns of the last `A`).
    pub fn rows(&self) -> usize {
        self.inv_diag.len()
    }

    pub fn cols(&self) -> usize {
        self.inv_diag.len()
    }

    /// The stored inverse scaling factors.
    pub fn inverse_diagonal(&self) -> &DVector<T> {
        &self.inv_diag
    }

    pub(crate) fn from_factors(inv_diag: DVector<T>) -> Self {
        Self {
            inv_diag,
            initialized: true,
        }
    }

    pub(crate) fn apply(&self, b: &DVector<T>) -> Result<DVector<T>> {
        if !self.initialized {
            return Ok(b.clone());
        }
        if b.len() != self.inv_diag.len() {
            return Err(Error::DimensionMismatch {
                expected: self.inv_diag.len(),
                got: b.len(),
            });
        }
        Ok(self.inv_diag.component_mul(b))
    }

    pub(crate) fn state(&self) -> ComputationInfo {
        if self.initialized {
            ComputationInfo::Success
        } else {
            ComputationInfo::InvalidInput
        }
    }
}

/// `1 / v`, or one when `v` is zero.
#[inline]
pub(crate) fn safe_inverse<T: RealField + Copy>(v: T) -> T {
    if v == T::zero() {
        T::one()
    } else {
        T::one() / v
    }
}

impl<T: RealField + Copy> Preconditioner<T> for DiagonalPreconditioner<T> {
    fn compute(&mut self, a: &DMatrix<T>) -> &mut Self {
        let n = a.ncols();
        let diag_len = a.nrows().min(n);
        self.inv_diag = DVector::from_fn(n, |j, _| {
            if j < diag_len {
                safe_inverse(a[(j, j)])
            } else {
                T::one()
            }
        });
        self.initialized = true;
        self
    }

    fn solve(&self, b: &DVector<T>) -> Result<DVector<T>> {
        self.apply(b)
    }

    fn info(&self) -> ComputationInfo {
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_diagonal() {
        let a = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 5.0, 2.0, 0.0, 2.0, 8.0]);
        let p = DiagonalPreconditioner::from_matrix(&a);
        assert_eq!(p.info(), ComputationInfo::Success);
        assert_eq!(p.inverse_diagonal().as_slice(), &[0.25, 0.2, 0.125]);
        assert_eq!((p.rows(), p.cols()), (3, 3));

        let z = p.solve(&DVector::from_vec(vec![4.0, 10.0, 16.0])).unwrap();
        assert_eq!(z.as_slice(), &[1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_zero_and_missing_diagonal() {
        // 2 x 3: column 2 has no diagonal entry; (1,1) is zero.
        let a = DMatrix::from_row_slice(2, 3, &[2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let p = DiagonalPreconditioner::from_matrix(&a);
        assert_eq!(p.inverse_diagonal().as_slice(), &[0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_uninitialized_is_identity_with_invalid_input() {
        let p = DiagonalPreconditioner::<f64>::new();
        assert_eq!(p.info(), ComputationInfo::InvalidInput);
        assert_eq!(p.rows(), 0);
        let b = DVector::from_vec(vec![1.0, -2.0]);
        assert_eq!(p.solve(&b).unwrap(), b);
    }

    #[test]
    fn test_dimension_mismatch() {
        let p = DiagonalPreconditioner::from_matrix(&DMatrix::<f64>::identity(3, 3));
        let err = p.solve(&DVector::zeros(2)).unwrap_err();
        assert_eq!(err, Error::DimensionMismatch { expected: 3, got: 2 });
    }

    #[test]
    fn test_recompute_replaces_factors() {
        let mut p = DiagonalPreconditioner::from_matrix(&DMatrix::<f64>::identity(2, 2));
        let a = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 4.0, 8.0]));
        assert_eq!(p.compute(&a).rows(), 3);
        assert_eq!(p.inverse_diagonal().as_slice(), &[0.5, 0.25, 0.125]);
    }
}
