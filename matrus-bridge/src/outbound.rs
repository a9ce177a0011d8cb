//! Native → host conversion.

use matrus_core::{AlignedBuffer, Element, Layout};

use crate::error::Result;
use crate::host::HostArray;
use crate::native::NativeMatrix;

/// Copy `m` into `dst` in row-major order.
///
/// Element `(i, j)` lands at `i * cols + j` whatever the native storage
/// order is.
///
/// # Panics
///
/// Panics if `dst.len() != rows * cols`.
pub fn copy_row_major<M: NativeMatrix>(m: &M, dst: &mut [M::Elem]) {
    let (rows, cols) = (m.nrows(), m.ncols());
    assert_eq!(
        dst.len(),
        rows * cols,
        "destination holds {} elements, matrix has {}x{}",
        dst.len(),
        rows,
        cols
    );
    let ld = Layout::RowMajor.leading_dim(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            dst[Layout::RowMajor.index(i, j, ld)] = m.at(i, j);
        }
    }
}

/// Fresh 2-D host array with the extents and values of `m`.
///
/// Vectors become `(n, 1)` or `(1, n)` arrays. The result owns its buffer;
/// `m` is not referenced after the call.
pub fn to_host_array<M: NativeMatrix>(m: &M) -> Result<HostArray> {
    let shape = [m.nrows(), m.ncols()];
    let code = <M::Elem as Element>::TYPE_CODE;
    let nbytes = shape[0]
        .checked_mul(shape[1])
        .and_then(|n| n.checked_mul(code.element_size()))
        .ok_or(matrus_core::Error::OutOfMemory { size: usize::MAX })?;
    let mut buffer = AlignedBuffer::zeroed(nbytes)?;
    copy_row_major(m, buffer.as_slice_mut::<M::Elem>());
    Ok(HostArray::from_buffer(code, &shape, buffer))
}
