//! Memory layout of 2-D buffers and stride arithmetic.
//!
//! Host arrays describe their layout with per-axis byte strides; native
//! matrices are column-major. Conversions in both directions go through
//! logical `(i, j)` indices, so neither side's storage order leaks into the
//! other.

use smallvec::SmallVec;

/// Memory layout for matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Row-major (C-style): elements in a row are contiguous.
    #[default]
    RowMajor,
    /// Column-major (Fortran-style): elements in a column are contiguous.
    ColMajor,
}

impl Layout {
    /// Leading dimension stride for an M x N matrix.
    #[inline(always)]
    pub fn leading_dim(self, rows: usize, cols: usize) -> usize {
        match self {
            Layout::RowMajor => cols,
            Layout::ColMajor => rows,
        }
    }

    /// Linear index into a flat array for element (i, j) of an M x N matrix.
    #[inline(always)]
    pub fn index(self, i: usize, j: usize, ld: usize) -> usize {
        match self {
            Layout::RowMajor => i * ld + j,
            Layout::ColMajor => j * ld + i,
        }
    }

    /// Byte strides of a packed buffer with this layout.
    pub fn byte_strides(self, shape: &[usize], itemsize: usize) -> SmallVec<[isize; 2]> {
        match self {
            Layout::RowMajor => row_major_byte_strides(shape, itemsize),
            Layout::ColMajor => {
                let mut strides: SmallVec<[isize; 2]> = SmallVec::with_capacity(shape.len());
                let mut acc = itemsize as isize;
                for &extent in shape {
                    strides.push(acc);
                    acc *= extent.max(1) as isize;
                }
                strides
            }
        }
    }
}

/// Byte strides of a packed C-ordered buffer.
pub fn row_major_byte_strides(shape: &[usize], itemsize: usize) -> SmallVec<[isize; 2]> {
    let mut strides: SmallVec<[isize; 2]> = SmallVec::from_elem(0, shape.len());
    let mut acc = itemsize as isize;
    for axis in (0..shape.len()).rev() {
        strides[axis] = acc;
        acc *= shape[axis].max(1) as isize;
    }
    strides
}

/// Convert per-axis byte strides to element strides.
///
/// The host guarantees strides are multiples of the item size for aligned
/// buffers; the division is exact on every path that reaches here.
pub fn element_strides(byte_strides: &[isize], itemsize: usize) -> SmallVec<[isize; 2]> {
    let itemsize = itemsize as isize;
    byte_strides
        .iter()
        .map(|&s| {
            debug_assert_eq!(s % itemsize, 0, "stride {} not a multiple of {}", s, itemsize);
            s / itemsize
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index() {
        assert_eq!(Layout::RowMajor.index(1, 2, 6), 8);
        assert_eq!(Layout::ColMajor.index(1, 2, 3), 7);
        assert_eq!(Layout::RowMajor.leading_dim(3, 6), 6);
        assert_eq!(Layout::ColMajor.leading_dim(3, 6), 3);
    }

    #[test]
    fn test_row_major_strides() {
        assert_eq!(row_major_byte_strides(&[3, 6], 8).as_slice(), &[48, 8]);
        assert_eq!(row_major_byte_strides(&[5], 4).as_slice(), &[4]);
        // Zero extents do not collapse the outer stride.
        assert_eq!(row_major_byte_strides(&[2, 0], 8).as_slice(), &[8, 8]);
    }

    #[test]
    fn test_col_major_strides() {
        assert_eq!(Layout::ColMajor.byte_strides(&[3, 6], 8).as_slice(), &[8, 24]);
    }

    #[test]
    fn test_element_strides() {
        assert_eq!(element_strides(&[48, 8], 8).as_slice(), &[6, 1]);
        assert_eq!(element_strides(&[-8, 96], 8).as_slice(), &[-1, 12]);
    }
}
