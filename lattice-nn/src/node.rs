use crate::{ConvolutionLayer, FullyConnectedLayer, InputLayer, Layer, LayerId};
use lattice_core::{Dims, LatticeError, Scalar, Tensor3};
use rand::RngCore;

/// Layer stored in a [`Network`](crate::Network), tagged by kind.
#[derive(Debug, Clone)]
pub enum Node<T> {
    /// See [`InputLayer`]
    Input(InputLayer<T>),
    /// See [`ConvolutionLayer`]
    Convolution(ConvolutionLayer<T>),
    /// See [`FullyConnectedLayer`]
    FullyConnected(FullyConnectedLayer<T>),
}

macro_rules! dispatch {
    ($node: expr, $layer: ident => $body: expr) => {
        match $node {
            Node::Input($layer) => $body,
            Node::Convolution($layer) => $body,
            Node::FullyConnected($layer) => $body,
        }
    };
}

impl<T: Scalar> Node<T> {
    /// Input layer, if this node is one
    #[must_use]
    pub fn as_input(&self) -> Option<&InputLayer<T>> {
        match self {
            Node::Input(l) => Some(l),
            _ => None,
        }
    }

    /// Mutable input layer, if this node is one
    pub fn as_input_mut(&mut self) -> Option<&mut InputLayer<T>> {
        match self {
            Node::Input(l) => Some(l),
            _ => None,
        }
    }

    /// Convolution layer, if this node is one
    #[must_use]
    pub fn as_convolution(&self) -> Option<&ConvolutionLayer<T>> {
        match self {
            Node::Convolution(l) => Some(l),
            _ => None,
        }
    }

    /// Mutable convolution layer, if this node is one
    pub fn as_convolution_mut(&mut self) -> Option<&mut ConvolutionLayer<T>> {
        match self {
            Node::Convolution(l) => Some(l),
            _ => None,
        }
    }

    /// Fully connected layer, if this node is one
    #[must_use]
    pub fn as_fully_connected(&self) -> Option<&FullyConnectedLayer<T>> {
        match self {
            Node::FullyConnected(l) => Some(l),
            _ => None,
        }
    }

    /// Mutable fully connected layer, if this node is one
    pub fn as_fully_connected_mut(&mut self) -> Option<&mut FullyConnectedLayer<T>> {
        match self {
            Node::FullyConnected(l) => Some(l),
            _ => None,
        }
    }
}

impl<T: Scalar> Layer<T> for Node<T> {
    fn name(&self) -> &'static str {
        dispatch!(self, l => l.name())
    }

    fn input(&self) -> Option<LayerId> {
        dispatch!(self, l => l.input())
    }

    fn output(&self) -> &Tensor3<T> {
        dispatch!(self, l => l.output())
    }

    fn output_mut(&mut self) -> &mut Tensor3<T> {
        dispatch!(self, l => l.output_mut())
    }

    fn grad(&self) -> &Tensor3<T> {
        dispatch!(self, l => l.grad())
    }

    fn grad_mut(&mut self) -> &mut Tensor3<T> {
        dispatch!(self, l => l.grad_mut())
    }

    fn output_and_grad_mut(&mut self) -> (&Tensor3<T>, &mut Tensor3<T>) {
        dispatch!(self, l => l.output_and_grad_mut())
    }

    fn dims(&self) -> Dims {
        dispatch!(self, l => l.dims())
    }

    fn forward(&mut self, input: &Tensor3<T>) -> Result<(), LatticeError> {
        dispatch!(self, l => l.forward(input))
    }

    fn backward(&mut self, input: &Tensor3<T>, input_grad: &mut Tensor3<T>) -> Result<(), LatticeError> {
        dispatch!(self, l => l.backward(input, input_grad))
    }

    fn zero_grad(&mut self) {
        dispatch!(self, l => l.zero_grad());
    }

    fn parameter_count(&self) -> usize {
        dispatch!(self, l => l.parameter_count())
    }

    fn init_uniform(&mut self, rng: &mut dyn RngCore) {
        dispatch!(self, l => l.init_uniform(rng));
    }
}

impl<T> From<InputLayer<T>> for Node<T> {
    fn from(value: InputLayer<T>) -> Self {
        Node::Input(value)
    }
}

impl<T> From<ConvolutionLayer<T>> for Node<T> {
    fn from(value: ConvolutionLayer<T>) -> Self {
        Node::Convolution(value)
    }
}

impl<T> From<FullyConnectedLayer<T>> for Node<T> {
    fn from(value: FullyConnectedLayer<T>) -> Self {
        Node::FullyConnected(value)
    }
}
