use lattice_core::{Dims, LatticeError, Scalar, Tensor3};
use rand::RngCore;

/// Index of a layer inside of a [`Network`](crate::Network).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(usize);

impl LayerId {
    /// Layer id from position in the network
    #[must_use]
    pub const fn new(index: usize) -> Self {
        LayerId(index)
    }

    /// Position of this layer in the network
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for LayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{}", self.0))
    }
}

/// Node of the compute chain.
///
/// A layer owns its output tensor, the gradient with respect to that
/// output, and its parameters. It never owns its input, the input is
/// referenced by [`LayerId`] and handed in by the caller on every pass.
///
/// Output dims are fixed at construction and never change.
pub trait Layer<T: Scalar> {
    /// Descriptive name of the operation
    fn name(&self) -> &'static str;

    /// Layer whose output this layer reads, `None` for input layers
    fn input(&self) -> Option<LayerId>;

    /// Output of the last forward pass
    fn output(&self) -> &Tensor3<T>;

    /// Mutable output
    fn output_mut(&mut self) -> &mut Tensor3<T>;

    /// Gradient of the loss with respect to the output
    fn grad(&self) -> &Tensor3<T>;

    /// Mutable gradient with respect to the output,
    /// successors accumulate into it during backward
    fn grad_mut(&mut self) -> &mut Tensor3<T>;

    /// Output and mutable gradient at once, what a successor needs for backward
    fn output_and_grad_mut(&mut self) -> (&Tensor3<T>, &mut Tensor3<T>);

    /// Output dims
    fn dims(&self) -> Dims {
        self.output().dims()
    }

    /// Number of output elements
    fn size(&self) -> usize {
        self.output().size()
    }

    /// Recompute output from input and current parameters.
    ///
    /// # Errors
    ///
    /// Errors if input dims differ from the dims the layer was built for.
    fn forward(&mut self, input: &Tensor3<T>) -> Result<(), LatticeError>;

    /// Accumulate parameter gradients and the gradient with respect to input.
    ///
    /// Reads [`Layer::grad`], adds to the parameter gradients and adds
    /// dLoss/dInput into `input_grad`. Nothing is overwritten, so several
    /// backward passes sum up until [`Layer::zero_grad`].
    ///
    /// # Errors
    ///
    /// Errors if input or `input_grad` dims differ from the dims the layer was built for.
    fn backward(&mut self, input: &Tensor3<T>, input_grad: &mut Tensor3<T>) -> Result<(), LatticeError>;

    /// Clear output gradient and parameter gradients
    fn zero_grad(&mut self);

    /// Number of trainable scalars
    fn parameter_count(&self) -> usize;

    /// Draw parameters from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`
    fn init_uniform(&mut self, rng: &mut dyn RngCore);
}

/// Fails unless tensor has the expected dims.
pub(crate) fn check_dims<T: Scalar>(
    layer: &str,
    what: &str,
    expected: Dims,
    tensor: &Tensor3<T>,
) -> Result<(), LatticeError> {
    if tensor.dims() != expected {
        return Err(LatticeError::shape_error(format!(
            "{layer} expected {what} with dims {expected:?}, got {:?}",
            tensor.dims()
        )));
    }
    Ok(())
}
