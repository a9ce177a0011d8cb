//! 64-byte aligned, zero-initialised host buffers.
//!
//! Every array the binding layer hands to the host is backed by one of
//! these. Unlike `Vec`, allocation failure is reported as
//! [`Error::OutOfMemory`] so the host runtime can raise its own
//! out-of-memory signal instead of the process aborting.

use std::alloc;
use std::ptr::NonNull;

use crate::error::{Error, Result};

/// Alignment for all host allocations (AVX-512 cache line).
pub const ALIGNMENT: usize = 64;

/// Owned, aligned byte region.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    len: usize,
    layout: alloc::Layout,
}

// The buffer is plain bytes owned by this value; shared access is read-only
// through `&self`.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate `len` zeroed bytes at [`ALIGNMENT`].
    ///
    /// Zero-length buffers still own a one-byte allocation so the data
    /// pointer is always real and aligned.
    pub fn zeroed(len: usize) -> Result<Self> {
        let layout = alloc::Layout::from_size_align(len.max(1), ALIGNMENT)
            .map_err(|_| Error::OutOfMemory { size: len })?;
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(Error::OutOfMemory { size: len })?;
        Ok(Self { ptr, len, layout })
    }

    /// Number of usable bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// View the buffer as a typed slice.
    ///
    /// # Panics
    ///
    /// Panics if the byte length is not a multiple of `size_of::<T>()`.
    pub fn as_slice<T: bytemuck::Pod>(&self) -> &[T] {
        bytemuck::cast_slice(self.as_bytes())
    }

    /// Mutable typed view; same contract as [`AlignedBuffer::as_slice`].
    pub fn as_slice_mut<T: bytemuck::Pod>(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(self.as_bytes_mut())
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        let buf = AlignedBuffer::zeroed(256).unwrap();
        assert_eq!(buf.as_ptr() as usize % ALIGNMENT, 0, "Buffer not 64-byte aligned");
        assert_eq!(buf.len(), 256);
    }

    #[test]
    fn test_zero_initialised() {
        let mut buf = AlignedBuffer::zeroed(64).unwrap();
        assert!(buf.as_bytes().iter().all(|&b| b == 0));
        let floats = buf.as_slice_mut::<f64>();
        assert_eq!(floats.len(), 8);
        floats[3] = 1.5;
        assert_eq!(buf.as_slice::<f64>()[3], 1.5);
    }

    #[test]
    fn test_empty_buffer_is_aligned() {
        let buf = AlignedBuffer::zeroed(0).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.as_ptr() as usize % ALIGNMENT, 0);
    }

    #[test]
    fn test_impossible_size_is_out_of_memory() {
        let err = AlignedBuffer::zeroed(usize::MAX - 8).unwrap_err();
        assert_eq!(err, Error::OutOfMemory { size: usize::MAX - 8 });
    }
}
