use std::fmt;

/// Outcome of the last `compute` on a solver object.
///
/// Discriminants follow the usual LAPACK-adjacent convention: 0 is success,
/// anything else is a failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ComputationInfo {
    /// Computation was successful.
    Success = 0,
    /// The provided data did not satisfy the prerequisites.
    NumericalIssue = 1,
    /// Iterative procedure did not converge.
    NoConvergence = 2,
    /// The inputs are invalid, or the object was never initialised.
    InvalidInput = 3,
}

impl ComputationInfo {
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, ComputationInfo::Success)
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ComputationInfo::Success),
            1 => Some(ComputationInfo::NumericalIssue),
            2 => Some(ComputationInfo::NoConvergence),
            3 => Some(ComputationInfo::InvalidInput),
            _ => None,
        }
    }
}

impl fmt::Display for ComputationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComputationInfo::Success => "Success",
            ComputationInfo::NumericalIssue => "NumericalIssue",
            ComputationInfo::NoConvergence => "NoConvergence",
            ComputationInfo::InvalidInput => "InvalidInput",
        };
        f.write_str(name)
    }
}
