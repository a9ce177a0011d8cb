//! # Matrus Solvers
//!
//! Basic preconditioners for iterative linear solvers, operating on dense
//! nalgebra matrices.
//!
//! A preconditioner approximates `A^-1` so that `z = M^-1 b` is cheap to
//! apply inside CG/BiCGSTAB-style loops:
//!
//! - [`DiagonalPreconditioner`]: Jacobi scaling by the inverse diagonal of `A`.
//! - [`LeastSquareDiagonalPreconditioner`]: Jacobi scaling for the normal
//!   equations `A' A x = A' b`, using the inverse squared column norms.
//! - [`IdentityPreconditioner`]: `z = b`.
//!
//! All of them report their state through [`ComputationInfo`].
//!
//! ```
//! use matrus_solvers::{ComputationInfo, DiagonalPreconditioner, Preconditioner};
//! use nalgebra::{DMatrix, DVector};
//!
//! let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 2.0]);
//! let p = DiagonalPreconditioner::from_matrix(&a);
//! assert_eq!(p.info(), ComputationInfo::Success);
//! let z = p.solve(&DVector::from_vec(vec![8.0, 2.0])).unwrap();
//! assert_eq!(z.as_slice(), &[2.0, 1.0]);
//! ```

pub mod diagonal;
pub mod error;
pub mod identity;
pub mod info;
pub mod least_squares;
pub mod preconditioner;

pub use diagonal::DiagonalPreconditioner;
pub use error::{Error, Result};
pub use identity::IdentityPreconditioner;
pub use info::ComputationInfo;
pub use least_squares::LeastSquareDiagonalPreconditioner;
pub use preconditioner::Preconditioner;
