use nalgebra::{DMatrix, DVector, RealField};

use crate::error::Result;
use crate::info::ComputationInfo;
use crate::preconditioner::Preconditioner;

/// A naive preconditioner which approximates any matrix as the identity.
///
/// Stateless: `compute` is a no-op and `info()` is always `Success`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl IdentityPreconditioner {
    pub fn new() -> Self {
        Self
    }
}

impl<T: RealField + Copy> Preconditioner<T> for IdentityPreconditioner {
    fn compute(&mut self, _a: &DMatrix<T>) -> &mut Self {
        self
    }

    fn solve(&self, b: &DVector<T>) -> Result<DVector<T>> {
        Ok(b.clone())
    }

    fn info(&self) -> ComputationInfo {
        ComputationInfo::Success
    }
}
