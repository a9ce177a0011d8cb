//! Host-side values: owned strided arrays and the dynamically typed value
//! the host runtime passes across the boundary.

use std::fmt;
use std::sync::Arc;

use matrus_core::{row_major_byte_strides, AlignedBuffer, Element, TypeCode};
use smallvec::{smallvec, SmallVec};

use crate::descriptor::ArrayDescriptor;
use crate::error::Result;
use crate::exposure::Instance;

/// An owned host array: a shared aligned buffer plus shape, byte strides
/// and a byte offset.
///
/// Views produced by [`transpose`](HostArray::transpose),
/// [`step`](HostArray::step) and [`flip_rows`](HostArray::flip_rows) share
/// the buffer and only rewrite the header, the way host array libraries
/// implement slicing.
#[derive(Clone)]
pub struct HostArray {
    type_code: TypeCode,
    shape: SmallVec<[usize; 2]>,
    strides: SmallVec<[isize; 2]>,
    offset: usize,
    buffer: Arc<AlignedBuffer>,
}

fn byte_len(shape: &[usize], itemsize: usize) -> Result<usize> {
    shape
        .iter()
        .try_fold(itemsize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            matrus_core::Error::InvalidShape {
                shape: shape.to_vec(),
                reason: "byte size overflows usize",
            }
            .into()
        })
}

impl HostArray {
    /// Wrap a freshly filled packed row-major buffer.
    pub(crate) fn from_buffer(type_code: TypeCode, shape: &[usize], buffer: AlignedBuffer) -> Self {
        debug_assert!(buffer.len() >= shape.iter().product::<usize>() * type_code.element_size());
        Self {
            type_code,
            shape: SmallVec::from_slice(shape),
            strides: row_major_byte_strides(shape, type_code.element_size()),
            offset: 0,
            buffer: Arc::new(buffer),
        }
    }

    /// Zero-filled packed row-major array.
    pub fn zeros(type_code: TypeCode, shape: &[usize]) -> Result<Self> {
        let buffer = AlignedBuffer::zeroed(byte_len(shape, type_code.element_size())?)?;
        Ok(Self::from_buffer(type_code, shape, buffer))
    }

    /// Packed row-major array holding `data`.
    pub fn from_row_major<T: Element>(shape: &[usize], data: &[T]) -> Result<Self> {
        if shape.iter().product::<usize>() != data.len() {
            return Err(matrus_core::Error::InvalidShape {
                shape: shape.to_vec(),
                reason: "element count does not match shape",
            }
            .into());
        }
        let mut buffer = AlignedBuffer::zeroed(byte_len(shape, T::SIZE)?)?;
        buffer.as_slice_mut::<T>().copy_from_slice(data);
        Ok(Self::from_buffer(T::TYPE_CODE, shape, buffer))
    }

    #[inline]
    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    #[inline]
    pub fn itemsize(&self) -> usize {
        self.type_code.element_size()
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Per-axis byte strides.
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the first element and every stride sit on the element
    /// alignment.
    pub fn is_aligned(&self) -> bool {
        let align = self.type_code.alignment();
        let start = self.buffer.as_ptr() as usize + self.offset;
        start % align == 0 && self.strides.iter().all(|&s| s % align as isize == 0)
    }

    /// Header view for the inbound converters.
    pub fn descriptor(&self) -> ArrayDescriptor<'_> {
        // Every offset reachable through shape/strides lies inside `buffer`,
        // which `self` keeps alive for the borrow.
        unsafe {
            ArrayDescriptor::from_raw_parts(
                self.type_code.raw(),
                self.itemsize(),
                &self.shape,
                &self.strides,
                self.is_aligned(),
                self.buffer.as_ptr().add(self.offset),
            )
        }
    }

    fn byte_position(&self, index: &[usize]) -> usize {
        let pos = index
            .iter()
            .zip(self.strides.iter())
            .fold(self.offset as isize, |acc, (&i, &s)| acc + i as isize * s);
        debug_assert!(pos >= 0);
        pos as usize
    }

    /// Byte positions of every element in logical row-major order.
    fn positions(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.len());
        if self.is_empty() {
            return out;
        }
        let mut index: SmallVec<[usize; 2]> = smallvec![0; self.ndim()];
        loop {
            out.push(self.byte_position(&index));
            let mut axis = self.ndim();
            loop {
                if axis == 0 {
                    return out;
                }
                axis -= 1;
                index[axis] += 1;
                if index[axis] < self.shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
    }

    /// Element at `index`, or `None` if `T` does not match the type code or
    /// the index is out of bounds.
    pub fn get<T: Element>(&self, index: &[usize]) -> Option<T> {
        if T::TYPE_CODE != self.type_code
            || index.len() != self.ndim()
            || index.iter().zip(self.shape.iter()).any(|(&i, &d)| i >= d)
        {
            return None;
        }
        let pos = self.byte_position(index);
        Some(bytemuck::pod_read_unaligned(&self.buffer.as_bytes()[pos..pos + T::SIZE]))
    }

    /// All elements in logical row-major order.
    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        if T::TYPE_CODE != self.type_code {
            return None;
        }
        let bytes = self.buffer.as_bytes();
        Some(
            self.positions()
                .into_iter()
                .map(|pos| bytemuck::pod_read_unaligned(&bytes[pos..pos + T::SIZE]))
                .collect(),
        )
    }

    /// Axis-reversed view sharing the buffer.
    pub fn transpose(&self) -> Self {
        let mut view = self.clone();
        view.shape.reverse();
        view.strides.reverse();
        view
    }

    /// Every `row_step`-th row and `col_step`-th column of a 2-D array,
    /// sharing the buffer (`a[::row_step, ::col_step]`).
    ///
    /// # Panics
    ///
    /// Panics if the array is not 2-D or a step is zero.
    pub fn step(&self, row_step: usize, col_step: usize) -> Self {
        assert_eq!(self.ndim(), 2, "step views need a 2-D array");
        assert!(row_step > 0 && col_step > 0, "steps must be positive");
        let mut view = self.clone();
        for (axis, step) in [row_step, col_step].into_iter().enumerate() {
            view.shape[axis] = (self.shape[axis] + step - 1) / step;
            view.strides[axis] = self.strides[axis] * step as isize;
        }
        view
    }

    /// View with the first axis reversed (`a[::-1]`), giving a negative
    /// leading stride.
    ///
    /// # Panics
    ///
    /// Panics on a 0-D array.
    pub fn flip_rows(&self) -> Self {
        assert!(self.ndim() > 0, "cannot flip a 0-D array");
        let mut view = self.clone();
        if self.shape[0] > 0 {
            let last = (self.shape[0] - 1) as isize * self.strides[0];
            view.offset = (self.offset as isize + last) as usize;
        }
        view.strides[0] = -self.strides[0];
        view
    }

    /// Packed copy whose first element starts `byte_offset` bytes into a
    /// fresh buffer. Offsets that are not a multiple of the element
    /// alignment produce an unaligned array.
    pub fn copy_at_offset(&self, byte_offset: usize) -> Result<Self> {
        let itemsize = self.itemsize();
        let total = byte_len(&self.shape, itemsize)?
            .checked_add(byte_offset)
            .ok_or(matrus_core::Error::OutOfMemory { size: usize::MAX })?;
        let mut buffer = AlignedBuffer::zeroed(total)?;
        let src = self.buffer.as_bytes();
        let dst = buffer.as_bytes_mut();
        for (k, pos) in self.positions().into_iter().enumerate() {
            let at = byte_offset + k * itemsize;
            dst[at..at + itemsize].copy_from_slice(&src[pos..pos + itemsize]);
        }
        Ok(Self {
            type_code: self.type_code,
            shape: self.shape.clone(),
            strides: row_major_byte_strides(&self.shape, itemsize),
            offset: byte_offset,
            buffer: Arc::new(buffer),
        })
    }
}

impl fmt::Debug for HostArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostArray")
            .field("dtype", &self.type_code)
            .field("shape", &self.shape.as_slice())
            .field("strides", &self.strides.as_slice())
            .field("offset", &self.offset)
            .finish()
    }
}

/// A value as seen by the host runtime.
#[derive(Debug, Clone)]
pub enum HostValue<'a> {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A foreign array borrowed for the duration of one call
    Array(ArrayDescriptor<'a>),
    /// An array owned by the binding layer (converter output)
    OwnedArray(HostArray),
    /// An exposed class instance
    Object(Arc<Instance>),
}

impl<'a> HostValue<'a> {
    /// Array header, for either array flavour.
    pub fn descriptor(&self) -> Option<ArrayDescriptor<'_>> {
        match self {
            HostValue::Array(desc) => Some(desc.clone()),
            HostValue::OwnedArray(array) => Some(array.descriptor()),
            _ => None,
        }
    }

    /// Host type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::None => "NoneType",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "str",
            HostValue::Array(_) | HostValue::OwnedArray(_) => "ndarray",
            HostValue::Object(instance) => instance.class_name(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&HostArray> {
        match self {
            HostValue::OwnedArray(array) => Some(array),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<HostArray> {
        match self {
            HostValue::OwnedArray(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Arc<Instance>> {
        match self {
            HostValue::Object(instance) => Some(instance),
            _ => None,
        }
    }
}

impl From<HostArray> for HostValue<'static> {
    fn from(array: HostArray) -> Self {
        HostValue::OwnedArray(array)
    }
}

impl<'a> From<ArrayDescriptor<'a>> for HostValue<'a> {
    fn from(desc: ArrayDescriptor<'a>) -> Self {
        HostValue::Array(desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HostArray {
        let data: Vec<f64> = (0..12).map(|v| v as f64).collect();
        HostArray::from_row_major(&[3, 4], &data).unwrap()
    }

    #[test]
    fn test_packed_layout() {
        let a = sample();
        assert_eq!(a.shape(), &[3, 4]);
        assert_eq!(a.strides(), &[32, 8]);
        assert!(a.is_aligned());
        assert_eq!(a.get::<f64>(&[2, 1]), Some(9.0));
        assert_eq!(a.get::<f64>(&[3, 0]), None);
        assert_eq!(a.get::<f32>(&[0, 0]), None);
    }

    #[test]
    fn test_shape_mismatch() {
        let err = HostArray::from_row_major(&[2, 2], &[1.0f64, 2.0, 3.0]).unwrap_err();
        assert!(err.to_string().contains("element count"));
    }

    #[test]
    fn test_zeros() {
        let a = HostArray::zeros(TypeCode::Int, &[2, 0]).unwrap();
        assert!(a.is_empty());
        assert_eq!(a.to_vec::<i32>(), Some(vec![]));

        let b = HostArray::zeros(TypeCode::Float, &[2, 2]).unwrap();
        assert_eq!(b.to_vec::<f32>(), Some(vec![0.0; 4]));
    }

    #[test]
    fn test_views() {
        let a = sample();

        let t = a.transpose();
        assert_eq!(t.shape(), &[4, 3]);
        assert_eq!(t.get::<f64>(&[1, 2]), Some(9.0));

        let s = a.step(2, 3);
        assert_eq!(s.shape(), &[2, 2]);
        assert_eq!(s.to_vec::<f64>(), Some(vec![0.0, 3.0, 8.0, 11.0]));

        let r = a.flip_rows();
        assert_eq!(r.strides()[0], -32);
        assert_eq!(r.get::<f64>(&[0, 0]), Some(8.0));
        assert_eq!(r.flip_rows().to_vec::<f64>(), a.to_vec::<f64>());
    }

    #[test]
    fn test_copy_at_offset() {
        let a = sample().transpose();
        let shifted = a.copy_at_offset(4).unwrap();
        assert!(!shifted.is_aligned());
        assert_eq!(shifted.to_vec::<f64>(), a.to_vec::<f64>());

        let realigned = a.copy_at_offset(8).unwrap();
        assert!(realigned.is_aligned());
    }

    #[test]
    fn test_descriptor_from_owned_value() {
        let value = HostValue::from(sample());
        let desc = value.descriptor().unwrap();
        assert_eq!(desc.type_code(), Some(TypeCode::Double));
        assert_eq!(desc.dims(), &[3, 4]);
        assert_eq!(value.type_name(), "ndarray");
        assert!(HostValue::Int(3).descriptor().is_none());
    }
}
