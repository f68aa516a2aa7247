//! Arena that owns every layer of a chain.
//!
//! Layers refer to their input by [`LayerId`], the position of the input
//! in the arena. A layer can only be added on top of a layer that already
//! exists and feeds nothing else, so the arena is a single chain stored in
//! input-to-output order and backward only needs to seed the last layer.

use crate::layer::check_dims;
use crate::{ConvolutionLayer, FullyConnectedLayer, InputLayer, Layer, LayerId, Node};
use lattice_core::{Config, Dims, LatticeError, Scalar, Tensor3};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::time::Instant;

/// Chain of layers with one in-flight sample.
#[derive(Debug, Clone)]
pub struct Network<T> {
    layers: Vec<Node<T>>,
    config: Config,
}

impl<T: Scalar> Default for Network<T> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<T: Scalar> Network<T> {
    /// Empty network
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Network { layers: Vec::new(), config }
    }

    /// Configuration this network was created with
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Number of layers
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Does this network contain no layers?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Id of the most recently added layer
    #[must_use]
    pub fn last(&self) -> Option<LayerId> {
        self.layers.len().checked_sub(1).map(LayerId::new)
    }

    /// All layers in input-to-output order
    #[must_use]
    pub fn layers(&self) -> &[Node<T>] {
        &self.layers
    }

    /// Get layer by id
    ///
    /// # Errors
    ///
    /// Errors if id does not name a layer of this network.
    pub fn layer(&self, id: LayerId) -> Result<&Node<T>, LatticeError> {
        let len = self.layers.len();
        self.layers.get(id.index()).ok_or(LatticeError::InvalidLayer { id: id.index(), len })
    }

    /// Get mutable layer by id, for example to set weights
    ///
    /// # Errors
    ///
    /// Errors if id does not name a layer of this network.
    pub fn layer_mut(&mut self, id: LayerId) -> Result<&mut Node<T>, LatticeError> {
        let len = self.layers.len();
        self.layers.get_mut(id.index()).ok_or(LatticeError::InvalidLayer { id: id.index(), len })
    }

    /// Output of layer, valid after [`Network::forward`]
    ///
    /// # Errors
    ///
    /// Errors if id does not name a layer of this network.
    pub fn output(&self, id: LayerId) -> Result<&Tensor3<T>, LatticeError> {
        Ok(self.layer(id)?.output())
    }

    /// Add input layer holding samples with given dims
    ///
    /// # Errors
    ///
    /// Errors if dims hold no elements.
    pub fn add_input(&mut self, dims: Dims) -> Result<LayerId, LatticeError> {
        let layer = InputLayer::new(dims)?;
        Ok(self.push(layer.into(), None))
    }

    /// Add convolution on top of layer `input`
    ///
    /// # Errors
    ///
    /// Errors if input is not a layer of this network, already feeds
    /// another layer, or hyperparameters are invalid, see [`ConvolutionLayer::new`].
    pub fn add_convolution(
        &mut self,
        input: LayerId,
        out_depth: usize,
        filter_size: usize,
        stride: usize,
        pad: usize,
    ) -> Result<LayerId, LatticeError> {
        let input_dims = self.consumable(input)?;
        let layer = ConvolutionLayer::new(input, input_dims, out_depth, filter_size, stride, pad)?
            .with_parallel(self.config.parallel);
        Ok(self.push(layer.into(), Some(input_dims)))
    }

    /// Add fully connected layer on top of layer `input`
    ///
    /// # Errors
    ///
    /// Errors if input is not a layer of this network, already feeds
    /// another layer, or out_depth is zero.
    pub fn add_fully_connected(&mut self, input: LayerId, out_depth: usize) -> Result<LayerId, LatticeError> {
        let input_dims = self.consumable(input)?;
        let layer = FullyConnectedLayer::new(input, input_dims, out_depth)?.with_parallel(self.config.parallel);
        Ok(self.push(layer.into(), Some(input_dims)))
    }

    // Dims of layer `input`, which must not feed any other layer yet.
    fn consumable(&self, input: LayerId) -> Result<Dims, LatticeError> {
        let dims = self.layer(input)?.dims();
        if let Some(i) = self.layers.iter().position(|l| l.input() == Some(input)) {
            return Err(LatticeError::config_error(format!("layer {input} already feeds layer {i}")));
        }
        Ok(dims)
    }

    fn push(&mut self, node: Node<T>, input_dims: Option<Dims>) -> LayerId {
        let id = LayerId::new(self.layers.len());
        if self.config.debug_shapes() {
            match input_dims {
                Some(input_dims) => tracing::debug!(
                    "layer {id} {}: {input_dims:?} -> {:?}, {} parameters",
                    node.name(),
                    node.dims(),
                    node.parameter_count()
                ),
                None => tracing::debug!("layer {id} {}: {:?}", node.name(), node.dims()),
            }
        }
        self.layers.push(node);
        id
    }

    /// Load sample into input layer
    ///
    /// # Errors
    ///
    /// Errors if id is not an input layer of this network or sample dims differ.
    pub fn set_input(&mut self, id: LayerId, sample: &Tensor3<T>) -> Result<(), LatticeError> {
        self.layer_mut(id)?
            .as_input_mut()
            .ok_or_else(|| LatticeError::config_error(format!("layer {id} is not an input layer")))?
            .load(sample)
    }

    /// Run forward of every layer in input-to-output order.
    ///
    /// # Errors
    ///
    /// Errors if any layer fails, layers after it keep their previous output.
    pub fn forward(&mut self) -> Result<(), LatticeError> {
        for i in 0..self.layers.len() {
            let Some(input) = self.layers[i].input() else { continue };
            let (before, rest) = self.layers.split_at_mut(i);
            let layer = &mut rest[0];
            let input = before.get(input.index()).ok_or(LatticeError::InvalidLayer { id: input.index(), len: i })?;
            let begin = Instant::now();
            layer.forward(input.output())?;
            if self.config.debug_perf() {
                tracing::debug!("forward {i} {} took {:?}", layer.name(), begin.elapsed());
            }
        }
        Ok(())
    }

    /// Backpropagate gradient of the loss with respect to the last layer's output.
    ///
    /// Clears every layer's output gradient, seeds the last layer with
    /// `output_grad` and runs backward of every layer in output-to-input order.
    /// Parameter gradients accumulate across calls until [`Network::zero_grad`].
    ///
    /// # Errors
    ///
    /// Errors if the network is empty, `output_grad` dims differ from the last
    /// layer's dims, or any layer fails. The first two are checked before any
    /// gradient is touched.
    pub fn backward(&mut self, output_grad: &Tensor3<T>) -> Result<(), LatticeError> {
        let last = self
            .layers
            .last()
            .ok_or_else(|| LatticeError::config_error("cannot run backward on an empty network"))?;
        check_dims(last.name(), "output gradient", last.dims(), output_grad)?;
        for layer in &mut self.layers {
            layer.grad_mut().zero();
        }
        if let Some(last) = self.layers.last_mut() {
            last.grad_mut().copy_from(output_grad)?;
        }
        for i in (0..self.layers.len()).rev() {
            let Some(input) = self.layers[i].input() else { continue };
            let (before, rest) = self.layers.split_at_mut(i);
            let layer = &mut rest[0];
            let input = before
                .get_mut(input.index())
                .ok_or(LatticeError::InvalidLayer { id: input.index(), len: i })?;
            let (input, input_grad) = input.output_and_grad_mut();
            let begin = Instant::now();
            layer.backward(input, input_grad)?;
            if self.config.debug_perf() {
                tracing::debug!("backward {i} {} took {:?}", layer.name(), begin.elapsed());
            }
        }
        Ok(())
    }

    /// Clear all gradients
    pub fn zero_grad(&mut self) {
        for layer in &mut self.layers {
            layer.zero_grad();
        }
    }

    /// Number of trainable scalars in all layers
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Draw all parameters from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`,
    /// the same seed always gives the same parameters.
    pub fn init_uniform(&mut self, seed: u64) {
        let mut rng = SmallRng::seed_from_u64(seed);
        for layer in &mut self.layers {
            layer.init_uniform(&mut rng);
        }
    }
}
