//! Error types for the binding layer.
//!
//! Two tiers, mirroring the conversion protocol:
//!
//! - [`Rejection`]: the convertibility check said no. Recoverable by the
//!   caller; the host runtime tries the next overload or raises its type
//!   error.
//! - [`Error`]: everything else that is reported rather than asserted.
//!   Invariant violations past the checkpoint panic instead.

use matrus_core::TypeCode;
use thiserror::Error;

use crate::registry::Direction;

/// Result type alias using matrus-bridge's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Why a host value is not convertible to a native matrix type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The value is not a host array at all
    #[error("expected an array, got {found}")]
    NotAnArray {
        /// Host type of the offending value
        found: &'static str,
    },

    /// Array rank other than 2 for a matrix target
    #[error("expected a 2-D array for {target}, got a {ndim}-D array")]
    Dimensionality {
        /// Rank of the array
        ndim: usize,
        /// Native target type
        target: String,
    },

    /// A 2-D array offered to a native vector type
    #[error("a 2-D array cannot convert to the vector type {target}")]
    MatrixForVector {
        /// Native target type
        target: String,
    },

    /// 1-D arrays for vector targets have no inbound path
    #[error("converting 1-D arrays to {target} is not implemented")]
    VectorInboundUnimplemented {
        /// Native target type
        target: String,
    },

    /// Element type tag differs from the target scalar's tag
    #[error("array has dtype {}, {target} requires {expected}", type_label(.found))]
    TypeMismatch {
        /// Tag required by the target scalar
        expected: TypeCode,
        /// Raw tag carried by the array
        found: i32,
        /// Native target type
        target: String,
    },

    /// The buffer or its strides are not aligned to the element type
    #[error("non-aligned arrays are not supported")]
    Unaligned,

    /// No inbound converter is registered for the target type
    #[error("no converter from arrays to {target} is registered")]
    NoConverter {
        /// Native target type
        target: String,
    },
}

fn type_label(raw: &i32) -> String {
    match TypeCode::from_raw(*raw) {
        Some(code) => code.to_string(),
        None => format!("#{}", raw),
    }
}

/// Errors raised by the binding layer
#[derive(Error, Debug)]
pub enum Error {
    /// Host buffer allocation or description failed
    #[error(transparent)]
    Core(#[from] matrus_core::Error),

    /// The preconditioner algorithm refused its input
    #[error(transparent)]
    Solve(#[from] matrus_solvers::Error),

    /// A native type crossed the boundary without a registered converter
    #[error("No {direction} converter registered for {type_name}")]
    Unregistered {
        /// Native type
        type_name: String,
        /// Requested direction
        direction: Direction,
    },

    /// A converter was registered twice under `ReregisterPolicy::Reject`
    #[error("{direction} converter for {type_name} is already registered")]
    DuplicateRegistration {
        /// Native type
        type_name: String,
        /// Direction registered twice
        direction: Direction,
    },

    /// Two capability sets composed into one class define the same method
    #[error("Method '{method}' is defined twice on {class}")]
    DuplicateMethod {
        /// Class being composed
        class: &'static str,
        /// Method name
        method: &'static str,
    },

    /// No capability set of a class provides a constructor
    #[error("Class {class} has no constructor")]
    MissingConstructor {
        /// Class being composed
        class: &'static str,
    },

    /// The process-wide registry was queried before `initialize`
    #[error("Conversion registry used before initialization")]
    NotInitialized,

    /// Lookup of a module-level function failed
    #[error("Module has no function '{0}'")]
    UnknownFunction(String),

    /// Lookup of an exposed class failed
    #[error("Module has no class '{0}'")]
    UnknownClass(String),

    /// Attribute lookup on an exposed instance failed
    #[error("'{class}' object has no attribute '{method}'")]
    UnknownMethod {
        /// Exposed class name
        class: &'static str,
        /// Requested attribute
        method: String,
    },

    /// Wrong number of positional arguments
    #[error("{callable}() takes {expected} arguments ({got} given)")]
    ArgumentCount {
        /// Function or method name
        callable: String,
        /// Accepted counts, e.g. "0 or 1"
        expected: String,
        /// Number supplied
        got: usize,
    },

    /// A non-overloaded parameter was not convertible
    #[error("argument '{param}' of {callable}(): {rejection}")]
    ArgumentType {
        /// Function or method name
        callable: String,
        /// Parameter name
        param: &'static str,
        /// Why the value was refused
        rejection: Rejection,
    },

    /// A converted argument has a shape the callee cannot use
    #[error("argument '{param}' of {callable}() must have shape {expected}, got ({rows}, {cols})")]
    ArgumentShape {
        /// Function or method name
        callable: String,
        /// Parameter name
        param: &'static str,
        /// Human readable expected shape
        expected: &'static str,
        /// Rows of the supplied value
        rows: usize,
        /// Columns of the supplied value
        cols: usize,
    },

    /// Every overload of a function rejected the arguments
    #[error("No overload of {function}() accepts these arguments:\n{details}")]
    NoMatchingOverload {
        /// Function name
        function: String,
        /// One line per overload explaining the rejection
        details: String,
    },

    /// An instance's state does not belong to its class
    #[error("{class} instance holds the state of another preconditioner")]
    StateMismatch {
        /// Exposed class name
        class: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let r = Rejection::TypeMismatch {
            expected: TypeCode::Double,
            found: TypeCode::Int.raw(),
            target: "Matrix<float64, Dyn, Dyn>".to_string(),
        };
        assert_eq!(
            r.to_string(),
            "array has dtype int32, Matrix<float64, Dyn, Dyn> requires float64"
        );

        let r = Rejection::TypeMismatch {
            expected: TypeCode::Float,
            found: 256,
            target: "Matrix<float32, Dyn, Dyn>".to_string(),
        };
        assert!(r.to_string().starts_with("array has dtype #256"));
    }
}
