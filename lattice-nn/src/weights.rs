use lattice_core::{Dims, LatticeError, Scalar, Tensor3};
use rand::RngCore;

/// Filter bank and bias of a layer together with their gradients.
///
/// Holds one filter per output depth slice and a `1 x 1 x depth` bias.
#[derive(Debug, Clone)]
pub(crate) struct Weights<T> {
    pub(crate) filters: Vec<Tensor3<T>>,
    pub(crate) filter_grads: Vec<Tensor3<T>>,
    pub(crate) bias: Tensor3<T>,
    pub(crate) bias_grad: Tensor3<T>,
}

impl<T: Scalar> Weights<T> {
    pub(crate) fn zeros(depth: usize, filter_dims: Dims) -> Result<Self, LatticeError> {
        let (fx, fy, fz) = filter_dims;
        let filters = (0..depth)
            .map(|_| Tensor3::zeros(fx, fy, fz))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Weights {
            filter_grads: filters.clone(),
            filters,
            bias: Tensor3::zeros(1, 1, depth)?,
            bias_grad: Tensor3::zeros(1, 1, depth)?,
        })
    }

    pub(crate) fn zero_grad(&mut self) {
        for g in &mut self.filter_grads {
            g.zero();
        }
        self.bias_grad.zero();
    }

    pub(crate) fn parameter_count(&self) -> usize {
        self.filters.iter().map(Tensor3::size).sum::<usize>() + self.bias.size()
    }

    pub(crate) fn init_uniform(&mut self, fan_in: usize, rng: &mut dyn RngCore) {
        let u = (1.0 / fan_in.max(1) as f64).sqrt();
        for filter in &mut self.filters {
            filter.fill_uniform(-u, u, &mut *rng);
        }
        self.bias.fill_uniform(-u, u, &mut *rng);
    }

    pub(crate) fn tensors(&self) -> Vec<&Tensor3<T>> {
        self.filters.iter().chain(core::iter::once(&self.bias)).collect()
    }

    pub(crate) fn tensors_mut(&mut self) -> Vec<&mut Tensor3<T>> {
        self.filters.iter_mut().chain(core::iter::once(&mut self.bias)).collect()
    }
}
