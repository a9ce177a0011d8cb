use approx::assert_relative_eq;
use matrus_bridge::inbound::{self, from_host};
use matrus_bridge::outbound::to_host_array;
use matrus_bridge::{init, BridgeConfig, Error, HostArray, HostValue, Rejection};
use matrus_core::TypeCode;
use nalgebra::{DMatrix, DVector, Matrix2, Matrix3x2, RowDVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_shape(rng: &mut StdRng) -> (usize, usize) {
    (rng.gen_range(1..9), rng.gen_range(1..9))
}

#[test]
fn test_round_trip_f64() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..25 {
        let (rows, cols) = random_shape(&mut rng);
        let m = DMatrix::<f64>::from_fn(rows, cols, |_, _| rng.gen_range(-1.0e3..1.0e3));
        let host: HostValue = to_host_array(&m).unwrap().into();
        let back: DMatrix<f64> = from_host(&host).unwrap();
        assert_eq!(back, m);
    }
}

#[test]
fn test_round_trip_f32() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..25 {
        let (rows, cols) = random_shape(&mut rng);
        let m = DMatrix::<f32>::from_fn(rows, cols, |_, _| rng.gen_range(-1.0..1.0));
        let host = to_host_array(&m).unwrap();
        assert_eq!(host.type_code(), TypeCode::Float);
        let back: DMatrix<f32> = from_host(&host.into()).unwrap();
        assert_eq!(back, m);
    }
}

#[test]
fn test_round_trip_i32() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..25 {
        let (rows, cols) = random_shape(&mut rng);
        let m = DMatrix::<i32>::from_fn(rows, cols, |_, _| rng.gen_range(-1000..1000));
        let host = to_host_array(&m).unwrap();
        let back: DMatrix<i32> = from_host(&host.into()).unwrap();
        assert_eq!(back, m);
    }
}

#[test]
fn test_shape_fidelity() {
    for (rows, cols) in [(1, 7), (7, 1), (1, 1), (4, 4)] {
        let m = DMatrix::<f64>::from_fn(rows, cols, |i, j| (i * 10 + j) as f64);
        let host = to_host_array(&m).unwrap();
        assert_eq!(host.shape(), &[rows, cols]);
        assert_eq!(host.get::<f64>(&[rows - 1, cols - 1]), Some(((rows - 1) * 10 + cols - 1) as f64));
        let back: DMatrix<f64> = from_host(&host.into()).unwrap();
        assert_eq!(back.shape(), (rows, cols));
    }
}

#[test]
fn test_vectors_out() {
    let col = DVector::from_vec(vec![1.5, -2.5, 3.5]);
    let host = to_host_array(&col).unwrap();
    assert_eq!(host.shape(), &[3, 1]);
    assert_eq!(host.to_vec::<f64>(), Some(vec![1.5, -2.5, 3.5]));

    let row = RowDVector::from_vec(vec![1, 2, 3, 4]);
    let host = to_host_array(&row).unwrap();
    assert_eq!(host.shape(), &[1, 4]);

    // Column vectors come back as (n, 1) matrices.
    let back: DMatrix<f64> = from_host(&to_host_array(&col).unwrap().into()).unwrap();
    assert_relative_eq!(back[(1, 0)], -2.5);
}

#[test]
fn test_type_codes_must_match_exactly() {
    let ints: HostValue = HostArray::from_row_major(&[2, 2], &[1i32, 2, 3, 4]).unwrap().into();
    assert!(inbound::is_convertible::<DMatrix<i32>>(&ints));
    for rejected in [
        inbound::check::<DMatrix<f64>>(&ints).map(|_| ()),
        inbound::check::<DMatrix<f32>>(&ints).map(|_| ()),
    ] {
        assert!(matches!(
            rejected,
            Err(Rejection::TypeMismatch { found: 5, .. })
        ));
    }
}

#[test]
fn test_vector_targets_are_rejected() {
    let flat: HostValue = HostArray::from_row_major(&[3], &[1.0f64, 2.0, 3.0]).unwrap().into();
    let column: HostValue = HostArray::from_row_major(&[3, 1], &[1.0f64, 2.0, 3.0]).unwrap().into();

    assert!(matches!(
        inbound::check::<DVector<f64>>(&flat),
        Err(Rejection::VectorInboundUnimplemented { .. })
    ));
    assert!(matches!(
        inbound::check::<DVector<f64>>(&column),
        Err(Rejection::MatrixForVector { .. })
    ));
    assert!(matches!(
        inbound::check::<RowDVector<f64>>(&column),
        Err(Rejection::MatrixForVector { .. })
    ));
}

#[test]
fn test_unaligned_is_rejected() {
    let m = DMatrix::<f64>::from_element(2, 2, 1.0);
    let host = to_host_array(&m).unwrap().copy_at_offset(1).unwrap();
    assert!(!host.is_aligned());
    assert_eq!(
        inbound::check::<DMatrix<f64>>(&host.into()).unwrap_err(),
        Rejection::Unaligned
    );
}

#[test]
fn test_foreign_descriptor() {
    // Column-major 3x2 buffer described with Fortran strides.
    let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
    let desc = unsafe {
        matrus_bridge::ArrayDescriptor::from_raw_parts(
            TypeCode::Double.raw(),
            8,
            &[3, 2],
            &[8, 24],
            true,
            data.as_ptr() as *const u8,
        )
    };
    let m: Matrix3x2<f64> = from_host(&HostValue::Array(desc)).unwrap();
    assert_eq!(m, Matrix3x2::new(1.0, 4.0, 2.0, 5.0, 3.0, 6.0));
}

#[test]
#[should_panic(expected = "fixed-extent mismatch")]
fn test_fixed_extent_mismatch() {
    let host: HostValue = HostArray::from_row_major(&[2, 3], &[0.0f64; 6]).unwrap().into();
    let _ = from_host::<Matrix2<f64>>(&host);
}

#[test]
fn test_echo_through_module() {
    let module = init(BridgeConfig::default()).unwrap();

    let ints: HostValue = HostArray::from_row_major(&[2, 3], &[1i32, 2, 3, 4, 5, 6]).unwrap().into();
    let out = module.call("echo_matrix", &[ints]).unwrap().into_array().unwrap();
    assert_eq!(out.type_code(), TypeCode::Int);
    assert_eq!(out.to_vec::<i32>(), Some(vec![1, 2, 3, 4, 5, 6]));

    let floats: HostValue = HostArray::from_row_major(&[1, 2], &[0.5f32, 1.5]).unwrap().into();
    let out = module.call("echo_matrix", &[floats]).unwrap().into_array().unwrap();
    assert_eq!(out.type_code(), TypeCode::Float);

    let bytes: HostValue = HostArray::zeros(TypeCode::UByte, &[2, 2]).unwrap().into();
    assert!(matches!(
        module.call("echo_matrix", &[bytes]),
        Err(Error::NoMatchingOverload { .. })
    ));
}
