//! The native side of the boundary: owned nalgebra matrices of fixed or
//! dynamic extent.

use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, Dim, OMatrix};

use matrus_core::Element;

/// An owned dense matrix type the converters can read and allocate.
///
/// Implemented for every `OMatrix<T, R, C>` with an [`Element`] scalar, so
/// `DMatrix<T>`, `DVector<T>`, `RowDVector<T>` and fixed-size matrices all
/// qualify. Extents that are part of the type are reported by
/// [`fixed_rows`](NativeMatrix::fixed_rows) /
/// [`fixed_cols`](NativeMatrix::fixed_cols).
pub trait NativeMatrix: Sized + 'static {
    type Elem: Element;

    /// Row count fixed by the type, `None` when dynamic.
    fn fixed_rows() -> Option<usize>;

    /// Column count fixed by the type, `None` when dynamic.
    fn fixed_cols() -> Option<usize>;

    /// Zero-filled value of the given extents. Fixed extents must match.
    fn allocate(rows: usize, cols: usize) -> Self;

    fn nrows(&self) -> usize;

    fn ncols(&self) -> usize;

    fn at(&self, i: usize, j: usize) -> Self::Elem;

    fn at_mut(&mut self, i: usize, j: usize) -> &mut Self::Elem;

    /// A type with exactly one row or one column.
    fn is_vector() -> bool {
        Self::fixed_rows() == Some(1) || Self::fixed_cols() == Some(1)
    }
}

impl<T, R, C> NativeMatrix for OMatrix<T, R, C>
where
    T: Element,
    R: Dim,
    C: Dim,
    DefaultAllocator: Allocator<T, R, C>,
{
    type Elem = T;

    fn fixed_rows() -> Option<usize> {
        R::try_to_usize()
    }

    fn fixed_cols() -> Option<usize> {
        C::try_to_usize()
    }

    fn allocate(rows: usize, cols: usize) -> Self {
        OMatrix::zeros_generic(R::from_usize(rows), C::from_usize(cols))
    }

    #[inline]
    fn nrows(&self) -> usize {
        self.shape().0
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.shape().1
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        self[(i, j)]
    }

    #[inline]
    fn at_mut(&mut self, i: usize, j: usize) -> &mut T {
        &mut self[(i, j)]
    }
}

/// Readable name of a native matrix type, e.g. `Matrix<float64, Dyn, 1>`.
pub fn describe<M: NativeMatrix>() -> String {
    fn extent(fixed: Option<usize>) -> String {
        fixed.map_or_else(|| "Dyn".to_string(), |n| n.to_string())
    }
    format!(
        "Matrix<{}, {}, {}>",
        <M::Elem as Element>::TYPE_CODE,
        extent(M::fixed_rows()),
        extent(M::fixed_cols())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector, Matrix2x3, RowDVector};

    #[test]
    fn test_extents() {
        assert_eq!(<DMatrix<f64> as NativeMatrix>::fixed_rows(), None);
        assert_eq!(<DVector<f64> as NativeMatrix>::fixed_cols(), Some(1));
        assert_eq!(<RowDVector<f32> as NativeMatrix>::fixed_rows(), Some(1));
        assert_eq!(<Matrix2x3<i32> as NativeMatrix>::fixed_rows(), Some(2));
        assert!(DVector::<f64>::is_vector());
        assert!(!DMatrix::<f64>::is_vector());
        assert!(!Matrix2x3::<f64>::is_vector());
    }

    #[test]
    fn test_allocate_and_index() {
        let mut m = DMatrix::<i32>::allocate(2, 3);
        *m.at_mut(1, 2) = 7;
        assert_eq!((m.nrows(), m.ncols()), (2, 3));
        assert_eq!(m.at(1, 2), 7);
        assert_eq!(m.at(0, 0), 0);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe::<DMatrix<f64>>(), "Matrix<float64, Dyn, Dyn>");
        assert_eq!(describe::<DVector<i32>>(), "Matrix<int32, Dyn, 1>");
        assert_eq!(describe::<Matrix2x3<f32>>(), "Matrix<float32, 2, 3>");
    }
}
