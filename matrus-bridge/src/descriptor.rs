//! Borrowed view of a host array header.

use std::marker::PhantomData;

use matrus_core::TypeCode;
use smallvec::SmallVec;

/// The fields of a host array the converters read: type tag, extents, byte
/// strides, alignment flag and data pointer.
///
/// The lifetime ties the descriptor to the host buffer it points into; a
/// descriptor never outlives the call that produced it.
#[derive(Debug, Clone)]
pub struct ArrayDescriptor<'a> {
    type_num: i32,
    itemsize: usize,
    dims: SmallVec<[usize; 2]>,
    strides: SmallVec<[isize; 2]>,
    aligned: bool,
    data: *const u8,
    _buffer: PhantomData<&'a [u8]>,
}

impl<'a> ArrayDescriptor<'a> {
    /// Describe a foreign array.
    ///
    /// # Safety
    ///
    /// For the lifetime `'a`, `data` must be valid for reads of `itemsize`
    /// bytes at every offset `sum(idx[k] * strides[k])` with
    /// `idx[k] < dims[k]`. When `aligned` is true, `data` and every stride
    /// must be multiples of the element alignment of `type_num`.
    ///
    /// # Panics
    ///
    /// Panics if `dims` and `strides` differ in length.
    pub unsafe fn from_raw_parts(
        type_num: i32,
        itemsize: usize,
        dims: &[usize],
        strides: &[isize],
        aligned: bool,
        data: *const u8,
    ) -> Self {
        assert_eq!(
            dims.len(),
            strides.len(),
            "array header has {} extents but {} strides",
            dims.len(),
            strides.len()
        );
        Self {
            type_num,
            itemsize,
            dims: SmallVec::from_slice(dims),
            strides: SmallVec::from_slice(strides),
            aligned,
            data,
            _buffer: PhantomData,
        }
    }

    /// Raw type number as stored in the header.
    #[inline]
    pub fn type_num(&self) -> i32 {
        self.type_num
    }

    /// Decoded type tag; `None` for user-defined host types.
    pub fn type_code(&self) -> Option<TypeCode> {
        TypeCode::from_raw(self.type_num)
    }

    #[inline]
    pub fn itemsize(&self) -> usize {
        self.itemsize
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Per-axis byte strides.
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    #[inline]
    pub fn data_ptr(&self) -> *const u8 {
        self.data
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_fields() {
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let desc = unsafe {
            ArrayDescriptor::from_raw_parts(
                TypeCode::Double.raw(),
                8,
                &[2, 3],
                &[24, 8],
                true,
                data.as_ptr() as *const u8,
            )
        };
        assert_eq!(desc.type_code(), Some(TypeCode::Double));
        assert_eq!(desc.ndim(), 2);
        assert_eq!(desc.dims(), &[2, 3]);
        assert_eq!(desc.strides(), &[24, 8]);
        assert_eq!(desc.len(), 6);
        assert!(desc.is_aligned());
    }

    #[test]
    fn test_unknown_type_number() {
        let byte = 0u8;
        let desc = unsafe { ArrayDescriptor::from_raw_parts(256, 1, &[1], &[1], true, &byte) };
        assert_eq!(desc.type_num(), 256);
        assert_eq!(desc.type_code(), None);
    }

    #[test]
    #[should_panic(expected = "extents but")]
    fn test_mismatched_header() {
        let byte = 0u8;
        let _ = unsafe { ArrayDescriptor::from_raw_parts(2, 1, &[1, 1], &[1], true, &byte) };
    }
}
