use crate::layer::{check_dims, Layer, LayerId};
use lattice_core::{Dims, LatticeError, Scalar, Tensor3};
use rand::RngCore;

/// Head of a chain, holds the current sample.
///
/// After backward its gradient buffer holds the gradient of the loss
/// with respect to the network input.
#[derive(Debug, Clone)]
pub struct InputLayer<T> {
    output: Tensor3<T>,
    grad: Tensor3<T>,
}

impl<T: Scalar> InputLayer<T> {
    /// Input layer holding samples of given dims
    ///
    /// # Errors
    ///
    /// Errors if any dimension is zero or the element count overflows.
    pub fn new(dims: Dims) -> Result<Self, LatticeError> {
        let (x, y, z) = dims;
        if x == 0 || y == 0 || z == 0 {
            return Err(LatticeError::config_error(format!("input dims {dims:?} hold no elements")));
        }
        Ok(InputLayer { output: Tensor3::zeros(x, y, z)?, grad: Tensor3::zeros(x, y, z)? })
    }

    /// Load sample into this layer
    ///
    /// # Errors
    ///
    /// Errors if sample dims differ from the layer dims.
    pub fn load(&mut self, sample: &Tensor3<T>) -> Result<(), LatticeError> {
        check_dims(self.name(), "sample", self.output.dims(), sample)?;
        self.output.copy_from(sample)
    }
}

impl<T: Scalar> Layer<T> for InputLayer<T> {
    fn name(&self) -> &'static str {
        "input"
    }

    fn input(&self) -> Option<LayerId> {
        None
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
        self.load(input)
    }

    fn backward(&mut self, _input: &Tensor3<T>, _input_grad: &mut Tensor3<T>) -> Result<(), LatticeError> {
        Ok(())
    }

    fn zero_grad(&mut self) {
        self.grad.zero();
    }

    fn parameter_count(&self) -> usize {
        0
    }

    fn init_uniform(&mut self, _rng: &mut dyn RngCore) {}
}
