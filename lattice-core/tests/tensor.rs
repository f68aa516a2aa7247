use lattice_core::{DType, LatticeError, Tensor3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[test]
fn set_get_round_trip() -> Result<(), LatticeError> {
    let mut rng = SmallRng::seed_from_u64(69420);
    let mut t = Tensor3::<f32>::zeros(4, 3, 5)?;
    let mut expected = Vec::new();
    for x in 0..4 {
        for y in 0..3 {
            for z in 0..5 {
                let v: f32 = rng.gen_range(-10.0..10.0);
                t.set(x, y, z, v)?;
                expected.push(((x, y, z), v));
            }
        }
    }
    for ((x, y, z), v) in expected {
        assert_eq!(t.get(x, y, z)?, v);
        assert_eq!(t.at(x, y, z), v);
    }
    Ok(())
}

#[test]
fn reset_zeroes() -> Result<(), LatticeError> {
    let mut t = Tensor3::<f64>::zeros(2, 2, 2)?;
    t.fill(7.);
    t.reset(3, 1, 2)?;
    assert_eq!(t.dims(), (3, 1, 2));
    assert_eq!(t.size(), 6);
    for x in 0..3 {
        for z in 0..2 {
            assert_eq!(t.get(x, 0, z)?, 0.);
        }
    }
    Ok(())
}

#[test]
fn reset_overflow_keeps_tensor() -> Result<(), LatticeError> {
    let mut t = Tensor3::<f32>::zeros(1, 2, 3)?;
    assert!(matches!(t.reset(usize::MAX, 2, 2), Err(LatticeError::ShapeError(_))));
    assert_eq!(t.dims(), (1, 2, 3));
    assert_eq!(t.size(), 6);
    Ok(())
}

#[test]
fn empty() {
    let t = Tensor3::<f32>::new();
    assert_eq!(t.dims(), (0, 0, 0));
    assert!(t.is_empty());
    assert_eq!(t, Tensor3::default());
    assert!(matches!(t.get(0, 0, 0), Err(LatticeError::IndexOutOfBounds { .. })));
}

#[test]
fn out_of_bounds() -> Result<(), LatticeError> {
    let mut t = Tensor3::<f32>::zeros(2, 3, 4)?;
    for (x, y, z) in [(2, 0, 0), (0, 3, 0), (0, 0, 4), (5, 5, 5)] {
        match t.get(x, y, z) {
            Err(LatticeError::IndexOutOfBounds { index, dims }) => {
                assert_eq!(index, (x, y, z));
                assert_eq!(dims, (2, 3, 4));
            }
            other => panic!("expected out of bounds, got {other:?}"),
        }
        assert!(t.set(x, y, z, 1.).is_err());
    }
    // Nothing was written by the failed sets.
    assert!(t.iter().all(|&v| v == 0.));
    assert!(matches!(
        t.get_flat(24),
        Err(LatticeError::FlatIndexOutOfBounds { index: 24, len: 24 })
    ));
    Ok(())
}

#[test]
fn z_fastest_linearization() -> Result<(), LatticeError> {
    let t = Tensor3::<f32>::from_vec((2, 2, 3), (0..12).map(|i| i as f32).collect())?;
    assert_eq!(t.get(0, 0, 2)?, 2.);
    assert_eq!(t.get(0, 1, 0)?, 3.);
    assert_eq!(t.get(1, 0, 0)?, 6.);
    assert_eq!(t.get(1, 1, 2)?, 11.);
    assert_eq!(t.linear_index(1, 1, 2), 11);
    assert_eq!(t[7], t.get(1, 0, 1)?);
    assert_eq!(t.get_flat(7)?, 7.);
    Ok(())
}

#[test]
fn from_vec_length_mismatch() {
    assert!(matches!(
        Tensor3::<f32>::from_vec((2, 2, 2), vec![0.; 7]),
        Err(LatticeError::ShapeError(_))
    ));
}

#[test]
fn in_bounds_checks_plane_only() -> Result<(), LatticeError> {
    let t = Tensor3::<f32>::zeros(3, 2, 1)?;
    assert!(t.is_in_bounds(2, 1));
    assert!(!t.is_in_bounds(3, 0));
    assert!(!t.is_in_bounds(0, 2));
    Ok(())
}

#[test]
fn copy_from() -> Result<(), LatticeError> {
    let a = Tensor3::<f64>::from_vec((1, 2, 2), vec![1., 2., 3., 4.])?;
    let mut b = Tensor3::zeros(1, 2, 2)?;
    b.copy_from(&a)?;
    assert_eq!(a, b);
    let mut c = Tensor3::zeros(2, 2, 1)?;
    assert!(matches!(c.copy_from(&a), Err(LatticeError::ShapeError(_))));
    Ok(())
}

#[test]
fn fill_uniform_is_seeded() -> Result<(), LatticeError> {
    let mut a = Tensor3::<f32>::zeros(3, 3, 3)?;
    let mut b = Tensor3::<f32>::zeros(3, 3, 3)?;
    a.fill_uniform(-0.5, 0.5, &mut SmallRng::seed_from_u64(3));
    b.fill_uniform(-0.5, 0.5, &mut SmallRng::seed_from_u64(3));
    assert_eq!(a, b);
    assert!(a.iter().all(|&v| (-0.5..=0.5).contains(&v)));
    assert!(a.iter().any(|&v| v != 0.));
    Ok(())
}

#[test]
fn display() -> Result<(), LatticeError> {
    let t = Tensor3::<f32>::from_vec((2, 1, 1), vec![1., 2.5])?;
    assert_eq!(t.dtype(), DType::F32);
    assert_eq!(format!("{t:.1}"), "Tensor3<f32>(2, 1, 1)\nz = 0\n1.0 2.5\n");
    Ok(())
}
