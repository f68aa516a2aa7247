use crate::layer::{check_dims, Layer, LayerId};
use crate::weights::Weights;
use lattice_core::{shape, Dims, LatticeError, Scalar, Tensor3};
use rand::RngCore;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Dense linear projection of the whole input volume.
///
/// Output has dims `(1, 1, out_depth)`. Unit `i` is the dot product of the
/// flattened input with filter `i` plus bias `i`. Input is flattened x-major,
/// then y, then z, which is the storage order of [`Tensor3`], and every filter
/// is stored as a `1 x 1 x num_inputs` tensor in the same order.
#[derive(Debug, Clone)]
pub struct FullyConnectedLayer<T> {
    input: LayerId,
    input_dims: Dims,
    num_inputs: usize,
    weights: Weights<T>,
    output: Tensor3<T>,
    grad: Tensor3<T>,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
}

fn dot<T: Scalar>(x: &[T], w: &[T]) -> T {
    x.iter().zip(w).fold(T::zero(), |sum, (&x, &w)| sum.add(x.mul(w)))
}

impl<T: Scalar> FullyConnectedLayer<T> {
    /// Initialize fully connected layer reading output of layer `input` with dims `input_dims`.
    ///
    /// Filters and bias start at zero.
    ///
    /// # Errors
    ///
    /// Errors if out_depth is zero or the input holds no elements.
    pub fn new(input: LayerId, input_dims: Dims, out_depth: usize) -> Result<Self, LatticeError> {
        if out_depth == 0 {
            return Err(LatticeError::config_error("fully connected output depth must be at least 1"));
        }
        let num_inputs = shape::numel(input_dims)?;
        if num_inputs == 0 {
            return Err(LatticeError::config_error(format!(
                "fully connected input dims {input_dims:?} hold no elements"
            )));
        }
        Ok(FullyConnectedLayer {
            input,
            input_dims,
            num_inputs,
            weights: Weights::zeros(out_depth, (1, 1, num_inputs))?,
            output: Tensor3::zeros(1, 1, out_depth)?,
            grad: Tensor3::zeros(1, 1, out_depth)?,
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

    /// Length of every filter
    #[must_use]
    pub const fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Filters, one `1 x 1 x num_inputs` tensor per output unit
    #[must_use]
    pub fn filters(&self) -> &[Tensor3<T>] {
        &self.weights.filters
    }

    /// Mutable filters
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

    // Every element of the input has to be consumed exactly once.
    fn check_consumed(&self, input: &Tensor3<T>) -> Result<(), LatticeError> {
        if input.size() != self.num_inputs {
            return Err(LatticeError::shape_error(format!(
                "fully connected consumed {} inputs, expected {}",
                input.size(),
                self.num_inputs
            )));
        }
        Ok(())
    }
}

impl<T: Scalar> Layer<T> for FullyConnectedLayer<T> {
    fn name(&self) -> &'static str {
        "fully connected"
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
        self.check_consumed(input)?;
        let x = input.as_slice();
        let weights = &self.weights;
        let run = |i: usize, o: &mut T| {
            *o = dot(x, weights.filters[i].as_slice()).add(weights.bias[i]);
        };
        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                self.output.as_mut_slice().par_iter_mut().enumerate().for_each(|(i, o)| run(i, o));
                return Ok(());
            }
        }
        self.output.as_mut_slice().iter_mut().enumerate().for_each(|(i, o)| run(i, o));
        Ok(())
    }

    fn backward(&mut self, input: &Tensor3<T>, input_grad: &mut Tensor3<T>) -> Result<(), LatticeError> {
        check_dims(self.name(), "input", self.input_dims, input)?;
        check_dims(self.name(), "input gradient", self.input_dims, input_grad)?;
        self.check_consumed(input)?;
        let x = input.as_slice();
        let dx = input_grad.as_mut_slice();
        let Weights { filters, filter_grads, bias_grad, .. } = &mut self.weights;
        for (i, &g) in self.grad.iter().enumerate() {
            bias_grad[i] = bias_grad[i].add(g);
            let w = filters[i].as_slice();
            let dw = filter_grads[i].as_mut_slice();
            for j in 0..x.len() {
                dw[j] = dw[j].add(g.mul(x[j]));
                dx[j] = dx[j].add(w[j].mul(g));
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
        self.weights.init_uniform(self.num_inputs, rng);
    }
}

impl<'a, T> IntoIterator for &'a FullyConnectedLayer<T>
where
    T: Scalar,
{
    type Item = &'a Tensor3<T>;
    type IntoIter = std::vec::IntoIter<&'a Tensor3<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.weights.tensors().into_iter()
    }
}

impl<'a, T> IntoIterator for &'a mut FullyConnectedLayer<T>
where
    T: Scalar,
{
    type Item = &'a mut Tensor3<T>;
    type IntoIter = std::vec::IntoIter<&'a mut Tensor3<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.weights.tensors_mut().into_iter()
    }
}
