use crate::layer::{check_dims, Layer, LayerId};
use crate::weights::Weights;
use lattice_core::{shape, Dims, LatticeError, Scalar, Tensor3};
use rand::RngCore;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Square sliding window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    size: usize,
    stride: usize,
    pad: usize,
}

impl Window {
    /// Input coordinate of filter cell `f` for window number `a`,
    /// `None` if it falls into the leading padding.
    fn input_coord(self, a: usize, f: usize) -> Option<usize> {
        (a * self.stride + f).checked_sub(self.pad)
    }

    /// Dot product of filter with the input window anchored at `(ax, ay)`, plus bias.
    ///
    /// Accumulates over filter y, then filter x, then depth, and adds
    /// the bias last. Cells outside of the input plane contribute nothing.
    fn convolve<T: Scalar>(self, filter: &Tensor3<T>, bias: T, input: &Tensor3<T>, ax: usize, ay: usize) -> T {
        let depth = input.dims().2;
        let mut sum = T::zero();
        for fy in 0..self.size {
            let Some(iy) = self.input_coord(ay, fy) else { continue };
            for fx in 0..self.size {
                let Some(ix) = self.input_coord(ax, fx) else { continue };
                if !input.is_in_bounds(ix, iy) {
                    continue;
                }
                for fd in 0..depth {
                    sum = sum.add(filter.at(fx, fy, fd).mul(input.at(ix, iy, fd)));
                }
            }
        }
        sum.add(bias)
    }
}

/// Applies a bank of learned `F x F x input_depth` filters across the input
/// plane with a given stride.
///
/// Output dims are `((in_x + 2P - F) / S + 1, (in_y + 2P - F) / S + 1, out_depth)`
/// with floor division. If the stride does not divide the span evenly,
/// the trailing input columns and rows are never visited.
#[derive(Debug, Clone)]
pub struct ConvolutionLayer<T> {
    input: LayerId,
    input_dims: Dims,
    window: Window,
    weights: Weights<T>,
    output: Tensor3<T>,
    grad: Tensor3<T>,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
}

impl<T: Scalar> ConvolutionLayer<T> {
    /// Initialize convolution reading output of layer `input` with dims `input_dims`.
    ///
    /// Filters and bias start at zero.
    ///
    /// # Errors
    ///
    /// Errors if pad is not zero, stride or out_depth is zero,
    /// or the filter does not fit into the input plane.
    pub fn new(
        input: LayerId,
        input_dims: Dims,
        out_depth: usize,
        filter_size: usize,
        stride: usize,
        pad: usize,
    ) -> Result<Self, LatticeError> {
        if pad != 0 {
            return Err(LatticeError::config_error(format!("unsupported pad size {pad}, only 0 is supported")));
        }
        if out_depth == 0 {
            return Err(LatticeError::config_error("convolution output depth must be at least 1"));
        }
        let (in_x, in_y, in_z) = input_dims;
        if in_z == 0 {
            return Err(LatticeError::config_error(format!("convolution input dims {input_dims:?} have no depth")));
        }
        let out_x = shape::window_count(in_x, filter_size, stride, pad)?;
        let out_y = shape::window_count(in_y, filter_size, stride, pad)?;
        Ok(ConvolutionLayer {
            input,
            input_dims,
            window: Window { size: filter_size, stride, pad },
            weights: Weights::zeros(out_depth, (filter_size, filter_size, in_z))?,
            output: Tensor3::zeros(out_x, out_y, out_depth)?,
            grad: Tensor3::zeros(out_x, out_y, out_depth)?,
            parallel: false,
        })
    }

    /// Run forward on the rayon thread pool, when compiled with the `parallel` feature
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Dims of the input this layer was built for
    #[must_use]
    pub const fn input_dims(&self) -> Dims {
        self.input_dims
    }

    /// Filter width and height
    #[must_use]
    pub const fn filter_size(&self) -> usize {
        self.window.size
    }

    /// Step between consecutive windows
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.window.stride
    }

    /// Zero padding on each side of the input plane
    #[must_use]
    pub const fn pad(&self) -> usize {
        self.window.pad
    }

    /// Filter bank, one filter per output depth slice
    #[must_use]
    pub fn filters(&self) -> &[Tensor3<T>] {
        &self.weights.filters
    }

    /// Mutable filter bank
    pub fn filters_mut(&mut self) -> &mut [Tensor3<T>] {
        &mut self.weights.filters
    }

    /// Bias with dims `(1, 1, out_depth)`
    #[must_use]
    pub const fn bias(&self) -> &Tensor3<T> {
        &self.weights.bias
    }

    /// Mutable bias
    pub fn bias_mut(&mut self) -> &mut Tensor3<T> {
        &mut self.weights.bias
    }

    /// Accumulated filter gradients
    #[must_use]
    pub fn filter_grads(&self) -> &[Tensor3<T>] {
        &self.weights.filter_grads
    }

    /// Accumulated bias gradient
    #[must_use]
    pub const fn bias_grad(&self) -> &Tensor3<T> {
        &self.weights.bias_grad
    }
}

impl<T: Scalar> Layer<T> for ConvolutionLayer<T> {
    fn name(&self) -> &'static str {
        "convolution"
    }

    fn input(&self) -> Option<LayerId> {
        Some(self.input)
    }

    fn output(&self) -> &Tensor3<T> {
        &self.output
    }

    fn output_mut(&mut self) -> &mut Tensor3<T> {
        &mut self.output
    }

    fn grad(&self) -> &Tensor3<T> {
        &self.grad
    }

    fn grad_mut(&mut self) -> &mut Tensor3<T> {
        &mut self.grad
    }

    fn output_and_grad_mut(&mut self) -> (&Tensor3<T>, &mut Tensor3<T>) {
        (&self.output, &mut self.grad)
    }

    fn forward(&mut self, input: &Tensor3<T>) -> Result<(), LatticeError> {
        check_dims(self.name(), "input", self.input_dims, input)?;
        let window = self.window;
        let weights = &self.weights;
        let (_, out_y, out_z) = self.output.dims();
        // Output is z fastest, so every spatial position owns out_z consecutive elements.
        let run = |p: usize, out: &mut [T]| {
            let (ax, ay) = (p / out_y, p % out_y);
            for (d, o) in out.iter_mut().enumerate() {
                *o = window.convolve(&weights.filters[d], weights.bias[d], input, ax, ay);
            }
        };
        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                self.output
                    .as_mut_slice()
                    .par_chunks_mut(out_z)
                    .enumerate()
                    .for_each(|(p, out)| run(p, out));
                return Ok(());
            }
        }
        self.output
            .as_mut_slice()
            .chunks_mut(out_z)
            .enumerate()
            .for_each(|(p, out)| run(p, out));
        Ok(())
    }

    fn backward(&mut self, input: &Tensor3<T>, input_grad: &mut Tensor3<T>) -> Result<(), LatticeError> {
        check_dims(self.name(), "input", self.input_dims, input)?;
        check_dims(self.name(), "input gradient", self.input_dims, input_grad)?;
        let window = self.window;
        let depth = self.input_dims.2;
        let (out_x, out_y, out_z) = self.output.dims();
        let Weights { filters, filter_grads, bias_grad, .. } = &mut self.weights;
        for ax in 0..out_x {
            for ay in 0..out_y {
                for d in 0..out_z {
                    let g = self.grad.at(ax, ay, d);
                    bias_grad[d] = bias_grad[d].add(g);
                    let filter = &filters[d];
                    let filter_grad = &mut filter_grads[d];
                    for fy in 0..window.size {
                        let Some(iy) = window.input_coord(ay, fy) else { continue };
                        for fx in 0..window.size {
                            let Some(ix) = window.input_coord(ax, fx) else { continue };
                            if !input.is_in_bounds(ix, iy) {
                                continue;
                            }
                            for fd in 0..depth {
                                let w = filter_grad.at_mut(fx, fy, fd);
                                *w = w.add(g.mul(input.at(ix, iy, fd)));
                                let x = input_grad.at_mut(ix, iy, fd);
                                *x = x.add(g.mul(filter.at(fx, fy, fd)));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn zero_grad(&mut self) {
        self.grad.zero();
        self.weights.zero_grad();
    }

    fn parameter_count(&self) -> usize {
        self.weights.parameter_count()
    }

    fn init_uniform(&mut self, rng: &mut dyn RngCore) {
        let (f, _, depth) = self.weights.filters.first().map_or((0, 0, 0), Tensor3::dims);
        self.weights.init_uniform(f * f * depth, rng);
    }
}

impl<'a, T> IntoIterator for &'a ConvolutionLayer<T>
where
    T: Scalar,
{
    type Item = &'a Tensor3<T>;
    type IntoIter = std::vec::IntoIter<&'a Tensor3<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.weights.tensors().into_iter()
    }
}

impl<'a, T> IntoIterator for &'a mut ConvolutionLayer<T>
where
    T: Scalar,
{
    type Item = &'a mut Tensor3<T>;
    type IntoIter = std::vec::IntoIter<&'a mut Tensor3<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.weights.tensors_mut().into_iter()
    }
}
