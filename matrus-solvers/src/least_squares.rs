//! Jacobi preconditioner for the normal equations.

use nalgebra::{DMatrix, DVector, RealField};

use crate::diagonal::{safe_inverse, DiagonalPreconditioner};
use crate::error::Result;
use crate::info::ComputationInfo;
use crate::preconditioner::Preconditioner;

/// Jacobi preconditioner for least-squares conjugate gradient.
///
/// Approximately solves `A' A x = A' b` assuming `A' A` is diagonal: the
/// scaling factors are the inverse squared column norms of `A`. It is a
/// [`DiagonalPreconditioner`] in every other respect and derefs to it.
#[derive(Debug, Clone)]
pub struct LeastSquareDiagonalPreconditioner<T: RealField + Copy> {
    base: DiagonalPreconditioner<T>,
}

impl<T: RealField + Copy> Default for LeastSquareDiagonalPreconditioner<T> {
    fn default() -> Self {
        Self {
            base: DiagonalPreconditioner::default(),
        }
    }
}

impl<T: RealField + Copy> LeastSquareDiagonalPreconditioner<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: RealField + Copy> std::ops::Deref for LeastSquareDiagonalPreconditioner<T> {
    type Target = DiagonalPreconditioner<T>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<T: RealField + Copy> Preconditioner<T> for LeastSquareDiagonalPreconditioner<T> {
    fn compute(&mut self, a: &DMatrix<T>) -> &mut Self {
        let factors = DVector::from_fn(a.ncols(), |j, _| {
            let sum = a.column(j).norm_squared();
            if sum > T::zero() {
                safe_inverse(sum)
            } else {
                T::one()
            }
        });
        self.base = DiagonalPreconditioner::from_factors(factors);
        self
    }

    fn solve(&self, b: &DVector<T>) -> Result<DVector<T>> {
        self.base.apply(b)
    }

    fn info(&self) -> ComputationInfo {
        self.base.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_column_norms() {
        // Columns: (1, 2, 2) -> 9, (0, 3, 4) -> 25
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 2.0, 3.0, 2.0, 4.0]);
        let p = LeastSquareDiagonalPreconditioner::from_matrix(&a);
        assert_eq!(p.info(), ComputationInfo::Success);
        assert_eq!((p.rows(), p.cols()), (2, 2));
        assert_relative_eq!(p.inverse_diagonal()[0], 1.0 / 9.0);
        assert_relative_eq!(p.inverse_diagonal()[1], 1.0 / 25.0);
    }

    #[test]
    fn test_zero_column_scales_by_one() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 0.0]);
        let p = LeastSquareDiagonalPreconditioner::from_matrix(&a);
        assert_eq!(p.inverse_diagonal().as_slice(), &[0.25, 1.0]);
    }

    #[test]
    fn test_solve_normal_equations_of_diagonal() {
        let a = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 3.0]));
        let p = LeastSquareDiagonalPreconditioner::from_matrix(&a);
        // A' b for b = (2, 3) is (4, 9); solution of A'A x = A'b is (1, 1).
        let z = p.solve(&DVector::from_vec(vec![4.0, 9.0])).unwrap();
        assert_relative_eq!(z[0], 1.0);
        assert_relative_eq!(z[1], 1.0);
    }

    #[test]
    fn test_uninitialized() {
        let p = LeastSquareDiagonalPreconditioner::<f64>::new();
        assert_eq!(p.info(), ComputationInfo::InvalidInput);
        let b = DVector::from_vec(vec![3.0]);
        assert_eq!(p.solve(&b).unwrap(), b);
    }
}
