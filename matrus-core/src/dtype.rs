//! Host array type codes and the native scalar → type code table.
//!
//! The host array library tags every buffer with an integer type number. The
//! discriminants below are the numpy type numbers so a tag read straight out
//! of a foreign array header can be compared without translation.
//!
//! The mapping from native scalars is the `Element` trait: a scalar type is
//! convertible exactly when it implements `Element`, so an unsupported scalar
//! is rejected by the compiler rather than truncated at runtime.

use std::fmt;

/// Element type tag of a host array.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TypeCode {
    Bool = 0,
    Byte = 1,
    UByte = 2,
    Short = 3,
    UShort = 4,
    /// C `int` (32-bit)
    Int = 5,
    UInt = 6,
    /// C `long` (64-bit on LP64 targets)
    Long = 7,
    ULong = 8,
    LongLong = 9,
    ULongLong = 10,
    /// C `float`
    Float = 11,
    /// C `double`
    Double = 12,
    LongDouble = 13,
    CFloat = 14,
    CDouble = 15,
    CLongDouble = 16,
    /// Boxed host objects
    Object = 17,
}

impl TypeCode {
    /// Decode a raw type number read from a foreign array header.
    pub const fn from_raw(raw: i32) -> Option<TypeCode> {
        Some(match raw {
            0 => TypeCode::Bool,
            1 => TypeCode::Byte,
            2 => TypeCode::UByte,
            3 => TypeCode::Short,
            4 => TypeCode::UShort,
            5 => TypeCode::Int,
            6 => TypeCode::UInt,
            7 => TypeCode::Long,
            8 => TypeCode::ULong,
            9 => TypeCode::LongLong,
            10 => TypeCode::ULongLong,
            11 => TypeCode::Float,
            12 => TypeCode::Double,
            13 => TypeCode::LongDouble,
            14 => TypeCode::CFloat,
            15 => TypeCode::CDouble,
            16 => TypeCode::CLongDouble,
            17 => TypeCode::Object,
            _ => return None,
        })
    }

    /// Raw type number.
    #[inline]
    pub const fn raw(self) -> i32 {
        self as i32
    }

    /// Size of one element in bytes (LP64 data model).
    pub const fn element_size(self) -> usize {
        match self {
            TypeCode::Bool | TypeCode::Byte | TypeCode::UByte => 1,
            TypeCode::Short | TypeCode::UShort => 2,
            TypeCode::Int | TypeCode::UInt | TypeCode::Float => 4,
            TypeCode::Long
            | TypeCode::ULong
            | TypeCode::LongLong
            | TypeCode::ULongLong
            | TypeCode::Double
            | TypeCode::CFloat
            | TypeCode::Object => 8,
            TypeCode::LongDouble | TypeCode::CDouble => 16,
            TypeCode::CLongDouble => 32,
        }
    }

    /// Required alignment of one element in bytes.
    ///
    /// Complex types align to their component, not their full size.
    pub const fn alignment(self) -> usize {
        match self {
            TypeCode::CFloat => 4,
            TypeCode::CDouble => 8,
            TypeCode::CLongDouble => 16,
            other => other.element_size(),
        }
    }

    /// Short dtype name as the host library prints it.
    pub const fn name(self) -> &'static str {
        match self {
            TypeCode::Bool => "bool",
            TypeCode::Byte => "int8",
            TypeCode::UByte => "uint8",
            TypeCode::Short => "int16",
            TypeCode::UShort => "uint16",
            TypeCode::Int => "int32",
            TypeCode::UInt => "uint32",
            TypeCode::Long => "int64",
            TypeCode::ULong => "uint64",
            TypeCode::LongLong => "longlong",
            TypeCode::ULongLong => "ulonglong",
            TypeCode::Float => "float32",
            TypeCode::Double => "float64",
            TypeCode::LongDouble => "longdouble",
            TypeCode::CFloat => "complex64",
            TypeCode::CDouble => "complex128",
            TypeCode::CLongDouble => "clongdouble",
            TypeCode::Object => "object",
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A native scalar that has a host array counterpart.
///
/// `Scalar + Zero` is what nalgebra needs to allocate a zeroed matrix of the
/// type and `Pod` lets host buffers be viewed as typed slices. `TYPE_CODE`
/// is the only tag a host array may carry to be converted into a matrix of
/// this scalar.
pub trait Element: nalgebra::Scalar + num_traits::Zero + bytemuck::Pod + Send + Sync {
    /// Host array tag for this scalar.
    const TYPE_CODE: TypeCode;

    /// Size of one element in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();
}

impl Element for f64 {
    const TYPE_CODE: TypeCode = TypeCode::Double;
}

impl Element for f32 {
    const TYPE_CODE: TypeCode = TypeCode::Float;
}

impl Element for i32 {
    const TYPE_CODE: TypeCode = TypeCode::Int;
}

/// Type code of the native scalar `T`.
#[inline]
pub const fn type_code_for<T: Element>() -> TypeCode {
    T::TYPE_CODE
}
