//! Host → native conversion, split in two phases.
//!
//! [`check`] decides without side effects whether a host value can become a
//! given native type and hands back a [`ConversionToken`]. Only a token can
//! be passed to [`construct_into`], which builds the value inside a
//! caller-provided [`ConversionSlot`] and copies the elements. Anything the
//! check did not rule out and that still goes wrong in phase 2 is an
//! invariant violation and panics.

use std::marker::PhantomData;
use std::mem::MaybeUninit;

use matrus_core::{element_strides, Element};
use tracing::{debug, warn};

use crate::descriptor::ArrayDescriptor;
use crate::error::Rejection;
use crate::host::HostValue;
use crate::native::{describe, NativeMatrix};

/// Proof that a host array passed the convertibility check for `M`.
///
/// Carries the array header unchanged.
#[derive(Debug)]
pub struct ConversionToken<'a, M> {
    descriptor: ArrayDescriptor<'a>,
    _target: PhantomData<fn() -> M>,
}

impl<'a, M> ConversionToken<'a, M> {
    pub fn descriptor(&self) -> &ArrayDescriptor<'a> {
        &self.descriptor
    }
}

/// Storage for one converted value, owned by the caller of
/// [`construct_into`].
///
/// Either empty or holding a fully constructed value; the value is dropped
/// with the slot unless taken out first.
pub struct ConversionSlot<M> {
    storage: MaybeUninit<M>,
    constructed: bool,
}

impl<M> ConversionSlot<M> {
    pub const fn new() -> Self {
        Self {
            storage: MaybeUninit::uninit(),
            constructed: false,
        }
    }

    #[inline]
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn get(&self) -> Option<&M> {
        if self.constructed {
            Some(unsafe { self.storage.assume_init_ref() })
        } else {
            None
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut M> {
        if self.constructed {
            Some(unsafe { self.storage.assume_init_mut() })
        } else {
            None
        }
    }

    /// Move the value out, leaving the slot empty.
    pub fn take(&mut self) -> Option<M> {
        if self.constructed {
            self.constructed = false;
            Some(unsafe { self.storage.assume_init_read() })
        } else {
            None
        }
    }

    fn emplace(&mut self, value: M) -> &mut M {
        assert!(!self.constructed, "conversion slot already holds a value");
        let value = self.storage.write(value);
        self.constructed = true;
        value
    }
}

impl<M> Default for ConversionSlot<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Drop for ConversionSlot<M> {
    fn drop(&mut self) {
        if self.constructed {
            unsafe { self.storage.assume_init_drop() };
        }
    }
}

/// Phase 1 on a bare array header.
pub fn check_descriptor<'a, M: NativeMatrix>(
    desc: ArrayDescriptor<'a>,
) -> Result<ConversionToken<'a, M>, Rejection> {
    match (desc.ndim(), M::is_vector()) {
        (2, false) => {}
        (2, true) => return Err(Rejection::MatrixForVector { target: describe::<M>() }),
        (1, true) => {
            return Err(Rejection::VectorInboundUnimplemented { target: describe::<M>() })
        }
        (ndim, _) => {
            return Err(Rejection::Dimensionality {
                ndim,
                target: describe::<M>(),
            })
        }
    }

    let expected = <M::Elem as Element>::TYPE_CODE;
    if desc.type_num() != expected.raw() {
        return Err(Rejection::TypeMismatch {
            expected,
            found: desc.type_num(),
            target: describe::<M>(),
        });
    }

    if !desc.is_aligned() {
        warn!("NPY non-aligned matrices are not implemented.");
        return Err(Rejection::Unaligned);
    }

    Ok(ConversionToken {
        descriptor: desc,
        _target: PhantomData,
    })
}

/// Phase 1: can `value` become an `M`?
pub fn check<'v, M: NativeMatrix>(
    value: &'v HostValue<'_>,
) -> Result<ConversionToken<'v, M>, Rejection> {
    let desc = value.descriptor().ok_or(Rejection::NotAnArray {
        found: value.type_name(),
    })?;
    check_descriptor(desc)
}

pub fn is_convertible<M: NativeMatrix>(value: &HostValue<'_>) -> bool {
    check::<M>(value).is_ok()
}

fn resolve_extent(axis: &str, fixed: Option<usize>, actual: usize, target: &str) -> usize {
    if let Some(n) = fixed {
        assert_eq!(
            n, actual,
            "fixed-extent mismatch: {} has {} {}, array has {}",
            target, n, axis, actual
        );
    }
    actual
}

/// Phase 2: build the `M` described by `token` inside `slot`.
///
/// # Panics
///
/// Panics if the token's array is not 2-D, if a fixed extent of `M`
/// differs from the array's, or if `slot` is already occupied.
pub fn construct_into<'s, M: NativeMatrix>(
    token: ConversionToken<'_, M>,
    slot: &'s mut ConversionSlot<M>,
) -> &'s mut M {
    let desc = token.descriptor;
    assert_eq!(
        desc.ndim(),
        2,
        "inbound conversion of 1-D arrays is not implemented"
    );
    debug_assert_eq!(desc.itemsize(), <M::Elem as Element>::SIZE);

    let strides = element_strides(desc.strides(), desc.itemsize());
    debug!(
        stride0 = strides[0],
        stride1 = strides[1],
        "element strides of inbound array"
    );

    let target = describe::<M>();
    let rows = resolve_extent("rows", M::fixed_rows(), desc.dims()[0], &target);
    let cols = resolve_extent("cols", M::fixed_cols(), desc.dims()[1], &target);

    let value = slot.emplace(M::allocate(rows, cols));
    let base = desc.data_ptr() as *const M::Elem;
    for i in 0..rows {
        for j in 0..cols {
            let offset = i as isize * strides[0] + j as isize * strides[1];
            // The check guaranteed alignment and the descriptor's contract
            // guarantees every (i, j) offset is readable.
            *value.at_mut(i, j) = unsafe { *base.offset(offset) };
        }
    }
    value
}

/// Check, construct and move the value out.
pub fn from_host<M: NativeMatrix>(value: &HostValue<'_>) -> Result<M, Rejection> {
    let token = check::<M>(value)?;
    let mut slot = ConversionSlot::new();
    construct_into(token, &mut slot);
    Ok(slot
        .take()
        .expect("construct_into leaves the slot constructed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostArray;
    use matrus_core::TypeCode;
    use nalgebra::{DMatrix, DVector, Matrix2x3, RowDVector};

    fn array_2x3() -> HostValue<'static> {
        HostArray::from_row_major(&[2, 3], &[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap()
            .into()
    }

    #[test]
    fn test_check_accepts_matching_matrix() {
        let value = array_2x3();
        let token = check::<DMatrix<f64>>(&value).unwrap();
        assert_eq!(token.descriptor().dims(), &[2, 3]);
        assert!(is_convertible::<DMatrix<f64>>(&value));
    }

    #[test]
    fn test_rejections() {
        let value = array_2x3();
        assert!(matches!(
            check::<DMatrix<f64>>(&HostValue::Int(1)),
            Err(Rejection::NotAnArray { found: "int" })
        ));
        assert!(matches!(
            check::<DMatrix<f32>>(&value),
            Err(Rejection::TypeMismatch { expected: TypeCode::Float, found: 12, .. })
        ));
        assert!(matches!(
            check::<DVector<f64>>(&value),
            Err(Rejection::MatrixForVector { .. })
        ));
        assert!(matches!(
            check::<RowDVector<f64>>(&value),
            Err(Rejection::MatrixForVector { .. })
        ));

        let flat: HostValue = HostArray::from_row_major(&[3], &[1.0f64, 2.0, 3.0])
            .unwrap()
            .into();
        assert!(matches!(
            check::<DVector<f64>>(&flat),
            Err(Rejection::VectorInboundUnimplemented { .. })
        ));
        assert!(matches!(
            check::<DMatrix<f64>>(&flat),
            Err(Rejection::Dimensionality { ndim: 1, .. })
        ));

        let cube: HostValue = HostArray::zeros(TypeCode::Double, &[2, 2, 2]).unwrap().into();
        assert!(matches!(
            check::<DMatrix<f64>>(&cube),
            Err(Rejection::Dimensionality { ndim: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_unaligned() {
        let shifted: HostValue = match array_2x3() {
            HostValue::OwnedArray(a) => a.copy_at_offset(3).unwrap().into(),
            _ => unreachable!(),
        };
        assert_eq!(
            check::<DMatrix<f64>>(&shifted).unwrap_err(),
            Rejection::Unaligned
        );
    }

    #[test]
    fn test_dimension_checked_before_type() {
        let flat: HostValue = HostArray::from_row_major(&[2], &[1i32, 2]).unwrap().into();
        assert!(matches!(
            check::<DMatrix<f64>>(&flat),
            Err(Rejection::Dimensionality { .. })
        ));
    }

    #[test]
    fn test_construct_in_slot() {
        let value = array_2x3();
        let token = check::<DMatrix<f64>>(&value).unwrap();
        let mut slot = ConversionSlot::new();
        assert!(!slot.is_constructed());
        let m = construct_into(token, &mut slot);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m[(0, 2)], 3.0);
        assert!(slot.is_constructed());
        assert_eq!(slot.get().map(|m| m.shape()), Some((2, 3)));
        let owned = slot.take().unwrap();
        assert!(!slot.is_constructed());
        assert_eq!(owned.nrows(), 2);
    }

    #[test]
    fn test_fixed_extents() {
        let value = array_2x3();
        let m: Matrix2x3<f64> = from_host(&value).unwrap();
        assert_eq!(m, Matrix2x3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
    }

    #[test]
    #[should_panic(expected = "fixed-extent mismatch")]
    fn test_fixed_extent_mismatch_panics() {
        let value = array_2x3();
        let _ = from_host::<nalgebra::Matrix3<f64>>(&value);
    }

    #[test]
    #[should_panic(expected = "inbound conversion of 1-D arrays is not implemented")]
    fn test_one_dimensional_token_panics() {
        let data = [1.0f64, 2.0];
        let desc = unsafe {
            ArrayDescriptor::from_raw_parts(12, 8, &[2], &[8], true, data.as_ptr() as *const u8)
        };
        let token = ConversionToken::<DMatrix<f64>> {
            descriptor: desc,
            _target: PhantomData,
        };
        let mut slot = ConversionSlot::new();
        construct_into(token, &mut slot);
    }

    #[test]
    #[should_panic(expected = "already holds a value")]
    fn test_slot_reuse_panics() {
        let value = array_2x3();
        let mut slot = ConversionSlot::<DMatrix<f64>>::new();
        construct_into(check(&value).unwrap(), &mut slot);
        construct_into(check(&value).unwrap(), &mut slot);
    }

    #[test]
    fn test_strided_views() {
        let data: Vec<i32> = (0..12).collect();
        let base = HostArray::from_row_major(&[3, 4], &data).unwrap();

        let t: DMatrix<i32> = from_host(&base.transpose().into()).unwrap();
        assert_eq!(t, DMatrix::from_fn(4, 3, |i, j| (j * 4 + i) as i32));

        let s: DMatrix<i32> = from_host(&base.step(2, 2).into()).unwrap();
        assert_eq!(s, DMatrix::from_row_slice(2, 2, &[0, 2, 8, 10]));

        let r: DMatrix<i32> = from_host(&base.flip_rows().into()).unwrap();
        assert_eq!(r.row(0).iter().copied().collect::<Vec<_>>(), vec![8, 9, 10, 11]);
    }
}
