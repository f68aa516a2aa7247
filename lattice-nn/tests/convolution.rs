use lattice_core::{Dims, LatticeError, Tensor3};
use lattice_nn::{ConvolutionLayer, Layer, LayerId};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const H: f64 = 1e-5;
const TOLERANCE: f64 = 1e-6;

fn random(dims: Dims, rng: &mut SmallRng) -> Result<Tensor3<f64>, LatticeError> {
    let mut t = Tensor3::zeros(dims.0, dims.1, dims.2)?;
    t.fill_uniform(-1., 1., rng);
    Ok(t)
}

// Loss is the output weighted by w, so dLoss/dOutput = w.
fn loss(layer: &mut ConvolutionLayer<f64>, input: &Tensor3<f64>, w: &Tensor3<f64>) -> Result<f64, LatticeError> {
    layer.forward(input)?;
    Ok(layer.output().iter().zip(w.iter()).map(|(o, w)| o * w).sum())
}

#[test]
fn all_ones_window() -> Result<(), LatticeError> {
    let mut conv = ConvolutionLayer::<f32>::new(LayerId::new(0), (5, 5, 1), 1, 3, 1, 0)?;
    assert_eq!(conv.dims(), (3, 3, 1));
    assert_eq!(conv.filters()[0].dims(), (3, 3, 1));
    assert_eq!(conv.bias().dims(), (1, 1, 1));
    conv.filters_mut()[0].fill(1.);
    let input = Tensor3::from_vec((5, 5, 1), vec![1.; 25])?;
    conv.forward(&input)?;
    assert_eq!(conv.output().as_slice(), &[9.; 9]);
    Ok(())
}

#[test]
fn bias_is_added_per_depth() -> Result<(), LatticeError> {
    let mut conv = ConvolutionLayer::<f32>::new(LayerId::new(0), (4, 4, 2), 2, 2, 2, 0)?;
    assert_eq!(conv.dims(), (2, 2, 2));
    conv.filters_mut()[0].fill(1.);
    conv.bias_mut().set(0, 0, 1, -3.)?;
    conv.forward(&Tensor3::from_vec((4, 4, 2), vec![0.5; 32])?)?;
    for ax in 0..2 {
        for ay in 0..2 {
            // 2 x 2 x 2 window of 0.5
            assert_eq!(conv.output().get(ax, ay, 0)?, 4.);
            assert_eq!(conv.output().get(ax, ay, 1)?, -3.);
        }
    }
    Ok(())
}

#[test]
fn stride_truncates() -> Result<(), LatticeError> {
    // (6 - 3) / 2 + 1 = 2.5, floored
    let mut conv = ConvolutionLayer::<f32>::new(LayerId::new(0), (6, 6, 1), 1, 3, 2, 0)?;
    assert_eq!(conv.dims(), (2, 2, 1));
    assert_eq!(ConvolutionLayer::<f32>::new(LayerId::new(0), (7, 7, 1), 1, 3, 2, 0)?.dims(), (3, 3, 1));
    assert_eq!(ConvolutionLayer::<f32>::new(LayerId::new(0), (7, 6, 1), 1, 3, 3, 0)?.dims(), (2, 2, 1));
    assert_eq!(ConvolutionLayer::<f32>::new(LayerId::new(0), (7, 7, 1), 1, 3, 1, 0)?.dims(), (5, 5, 1));

    // The last row and column are never visited.
    conv.filters_mut()[0].fill(1.);
    let mut input = Tensor3::from_vec((6, 6, 1), vec![1.; 36])?;
    for i in 0..6 {
        input.set(5, i, 0, 100.)?;
        input.set(i, 5, 0, 100.)?;
    }
    conv.forward(&input)?;
    assert_eq!(conv.output().as_slice(), &[9.; 4]);
    Ok(())
}

#[test]
fn invalid_hyperparameters() {
    let id = LayerId::new(0);
    let new = |dims, depth, filter, stride, pad| ConvolutionLayer::<f32>::new(id, dims, depth, filter, stride, pad);
    assert!(matches!(new((5, 5, 1), 1, 3, 1, 1), Err(LatticeError::ConfigError(_))));
    assert!(matches!(new((5, 5, 1), 0, 3, 1, 0), Err(LatticeError::ConfigError(_))));
    assert!(matches!(new((5, 5, 1), 1, 6, 1, 0), Err(LatticeError::ConfigError(_))));
    assert!(matches!(new((5, 2, 1), 1, 3, 1, 0), Err(LatticeError::ConfigError(_))));
    assert!(matches!(new((5, 5, 1), 1, 3, 0, 0), Err(LatticeError::ConfigError(_))));
    assert!(matches!(new((5, 5, 0), 1, 3, 1, 0), Err(LatticeError::ConfigError(_))));
}

#[test]
fn input_dims_must_match() -> Result<(), LatticeError> {
    let mut conv = ConvolutionLayer::<f32>::new(LayerId::new(0), (5, 5, 2), 1, 3, 1, 0)?;
    assert!(matches!(conv.forward(&Tensor3::zeros(5, 5, 1)?), Err(LatticeError::ShapeError(_))));
    let mut dx = Tensor3::zeros(5, 5, 1)?;
    assert!(matches!(
        conv.backward(&Tensor3::zeros(5, 5, 2)?, &mut dx),
        Err(LatticeError::ShapeError(_))
    ));
    Ok(())
}

#[test]
fn matches_direct_sum() -> Result<(), LatticeError> {
    let mut rng = SmallRng::seed_from_u64(69420);
    let (in_dims, f, s, depth) = ((7, 5, 3), 3, 2, 4);
    let mut conv = ConvolutionLayer::<f64>::new(LayerId::new(0), in_dims, depth, f, s, 0)?;
    conv.init_uniform(&mut rng);
    let input = random(in_dims, &mut rng)?;
    conv.forward(&input)?;
    let (ox, oy, oz) = conv.dims();
    assert_eq!((ox, oy, oz), (3, 2, 4));
    for ax in 0..ox {
        for ay in 0..oy {
            for d in 0..oz {
                let mut sum = 0.;
                for fx in 0..f {
                    for fy in 0..f {
                        for fd in 0..in_dims.2 {
                            sum += conv.filters()[d].get(fx, fy, fd)? * input.get(ax * s + fx, ay * s + fy, fd)?;
                        }
                    }
                }
                sum += conv.bias().get(0, 0, d)?;
                assert!((conv.output().get(ax, ay, d)? - sum).abs() < 1e-12);
            }
        }
    }
    Ok(())
}

#[test]
fn forward_is_deterministic() -> Result<(), LatticeError> {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut conv = ConvolutionLayer::<f32>::new(LayerId::new(0), (9, 9, 3), 5, 3, 2, 0)?;
    conv.init_uniform(&mut rng);
    let mut input = Tensor3::zeros(9, 9, 3)?;
    input.fill_uniform(-1., 1., &mut rng);
    conv.forward(&input)?;
    let first = conv.output().clone();
    conv.forward(&input)?;
    assert_eq!(first.as_slice(), conv.output().as_slice());

    let mut parallel = conv.clone().with_parallel(true);
    parallel.forward(&input)?;
    assert_eq!(first.as_slice(), parallel.output().as_slice());
    Ok(())
}

#[test]
fn backward_matches_finite_differences() -> Result<(), LatticeError> {
    let mut rng = SmallRng::seed_from_u64(42);
    for (in_dims, f, s, depth) in [((5, 4, 2), 2, 1, 3), ((7, 7, 1), 3, 2, 2)] {
        let mut conv = ConvolutionLayer::<f64>::new(LayerId::new(0), in_dims, depth, f, s, 0)?;
        conv.init_uniform(&mut rng);
        let mut input = random(in_dims, &mut rng)?;
        let w = random(conv.dims(), &mut rng)?;

        conv.forward(&input)?;
        conv.grad_mut().copy_from(&w)?;
        let mut dx = Tensor3::zeros(in_dims.0, in_dims.1, in_dims.2)?;
        conv.backward(&input, &mut dx)?;

        for i in 0..input.size() {
            let x = input[i];
            input[i] = x + H;
            let plus = loss(&mut conv, &input, &w)?;
            input[i] = x - H;
            let minus = loss(&mut conv, &input, &w)?;
            input[i] = x;
            let numeric = (plus - minus) / (2. * H);
            assert!((dx[i] - numeric).abs() < TOLERANCE, "input {i}: {} vs {numeric}", dx[i]);
        }

        let filter_grads = conv.filter_grads().to_vec();
        for d in 0..depth {
            for i in 0..filter_grads[d].size() {
                let x = conv.filters()[d][i];
                conv.filters_mut()[d][i] = x + H;
                let plus = loss(&mut conv, &input, &w)?;
                conv.filters_mut()[d][i] = x - H;
                let minus = loss(&mut conv, &input, &w)?;
                conv.filters_mut()[d][i] = x;
                let numeric = (plus - minus) / (2. * H);
                assert!((filter_grads[d][i] - numeric).abs() < TOLERANCE);
            }
        }

        let (ox, oy, _) = conv.dims();
        for d in 0..depth {
            let mut expected = 0.;
            for ax in 0..ox {
                for ay in 0..oy {
                    expected += w.get(ax, ay, d)?;
                }
            }
            assert!((conv.bias_grad()[d] - expected).abs() < 1e-12);
        }
    }
    Ok(())
}

#[test]
fn backward_accumulates() -> Result<(), LatticeError> {
    let mut rng = SmallRng::seed_from_u64(5);
    let mut conv = ConvolutionLayer::<f64>::new(LayerId::new(0), (4, 4, 1), 2, 2, 1, 0)?;
    conv.init_uniform(&mut rng);
    let input = random((4, 4, 1), &mut rng)?;
    conv.forward(&input)?;
    conv.grad_mut().fill(1.);

    let mut once = Tensor3::zeros(4, 4, 1)?;
    conv.backward(&input, &mut once)?;
    let filter_grads = conv.filter_grads().to_vec();
    let bias_grad = conv.bias_grad().clone();

    let mut twice = Tensor3::zeros(4, 4, 1)?;
    conv.backward(&input, &mut twice)?;
    conv.backward(&input, &mut twice)?;
    for i in 0..once.size() {
        assert!((twice[i] - 2. * once[i]).abs() < 1e-12);
    }
    for (g, g0) in conv.filter_grads().iter().zip(&filter_grads) {
        for i in 0..g.size() {
            assert!((g[i] - 3. * g0[i]).abs() < 1e-12);
        }
    }
    // 3 x 3 output positions, gradient 1 each, three backward passes
    assert_eq!(bias_grad.as_slice(), &[9., 9.]);
    assert_eq!(conv.bias_grad().as_slice(), &[27., 27.]);

    conv.zero_grad();
    assert!(conv.bias_grad().iter().all(|&g| g == 0.));
    assert!(conv.grad().iter().all(|&g| g == 0.));
    assert!(conv.filter_grads().iter().all(|g| g.iter().all(|&g| g == 0.)));
    Ok(())
}

#[test]
fn parameters() -> Result<(), LatticeError> {
    let mut conv = ConvolutionLayer::<f32>::new(LayerId::new(3), (8, 8, 3), 4, 3, 1, 0)?;
    assert_eq!(conv.input(), Some(LayerId::new(3)));
    assert_eq!(conv.name(), "convolution");
    assert_eq!((conv.filter_size(), conv.stride(), conv.pad()), (3, 1, 0));
    assert_eq!(conv.input_dims(), (8, 8, 3));
    assert_eq!(conv.parameter_count(), 4 * 3 * 3 * 3 + 4);
    assert_eq!((&conv).into_iter().count(), 5);
    for t in &mut conv {
        t.fill(2.);
    }
    assert!(conv.filters().iter().all(|f| f.iter().all(|&v| v == 2.)));
    assert_eq!(conv.bias().as_slice(), &[2.; 4]);
    Ok(())
}
