//! Exact propagation of input derivatives through the network.
//!
//! A [`Jet`] carries, for a batch of (x, t) points, the layer activations
//! together with their first derivatives in x and t and their second
//! derivative in x, the quantities the Schrödinger residual needs. Each
//! layer maps the whole bundle through the analytic chain rule using
//! ordinary tensor operations, so on an autodiff backend the derivative
//! channels stay on the tape and the training loss can be backpropagated
//! through them into the network parameters.

use burn::nn::Linear;
use burn::prelude::Backend;
use burn::tensor::Tensor;
use burn::tensor::activation;

use crate::error::{PinnError, Result};

/// Batched value / ∂x / ∂t / ∂²x² bundle, all of shape `[n, width]`.
#[derive(Debug, Clone)]
pub struct Jet<B: Backend> {
    pub value: Tensor<B, 2>,
    pub dx: Tensor<B, 2>,
    pub dt: Tensor<B, 2>,
    pub dxx: Tensor<B, 2>,
}

impl<B: Backend> Jet<B> {
    /// Seeds a jet at the raw coordinates: `value = [x | t]` with unit
    /// tangents in the matching columns. This is where x and t become
    /// differentiable inputs.
    pub fn seed(x: Tensor<B, 2>, t: Tensor<B, 2>) -> Result<Self> {
        let [n, wx] = x.dims();
        let [nt, wt] = t.dims();
        if wx != 1 || wt != 1 || n != nt {
            return Err(PinnError::DataShape(format!(
                "coordinate batches must be matching [n, 1] columns, got x: {:?}, t: {:?}",
                [n, wx],
                [nt, wt]
            )));
        }
        let ones = Tensor::ones_like(&x);
        let zeros = Tensor::zeros_like(&x);
        Ok(Self {
            value: Tensor::cat(vec![x, t], 1),
            dx: Tensor::cat(vec![ones.clone(), zeros.clone()], 1),
            dt: Tensor::cat(vec![zeros.clone(), ones], 1),
            dxx: Tensor::cat(vec![zeros.clone(), zeros], 1),
        })
    }

    /// Affine map `value * scale + shift` with row-broadcast coefficients;
    /// tangents scale linearly, curvature likewise.
    pub fn affine(self, scale: Tensor<B, 2>, shift: Tensor<B, 2>) -> Self {
        Self {
            value: self.value * scale.clone() + shift,
            dx: self.dx * scale.clone(),
            dt: self.dt * scale.clone(),
            dxx: self.dxx * scale,
        }
    }

    /// Pushes the jet through a linear layer. The bias shifts only the
    /// value channel; every tangent maps through the weight matrix alone.
    pub fn linear(&self, layer: &Linear<B>) -> Self {
        let weight = layer.weight.val();
        Self {
            value: layer.forward(self.value.clone()),
            dx: self.dx.clone().matmul(weight.clone()),
            dt: self.dt.clone().matmul(weight.clone()),
            dxx: self.dxx.clone().matmul(weight),
        }
    }

    /// Elementwise tanh with its chain rule:
    /// `s' = (1 - s²)·z'` and `s'' = (1 - s²)·z'' - 2·s·(1 - s²)·(z')²`.
    pub fn tanh(self) -> Self {
        let s = activation::tanh(self.value);
        let g = Tensor::ones_like(&s) - s.clone() * s.clone();
        let dx = g.clone() * self.dx.clone();
        let dt = g.clone() * self.dt;
        let dxx = g.clone() * self.dxx
            - s.clone() * g * self.dx.clone() * self.dx * 2.0;
        Self { value: s, dx, dt, dxx }
    }

    /// Componentwise sum of two jets (the residual skip connection).
    pub fn add(self, other: Self) -> Self {
        Self {
            value: self.value + other.value,
            dx: self.dx + other.dx,
            dt: self.dt + other.dt,
            dxx: self.dxx + other.dxx,
        }
    }

    /// Extracts one output channel, shape `[n, 1]`, from every bundle.
    pub fn channel(&self, index: usize) -> (Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>) {
        let n = self.value.dims()[0];
        let range = [0..n, index..index + 1];
        (
            self.value.clone().slice(range.clone()),
            self.dx.clone().slice(range.clone()),
            self.dt.clone().slice(range.clone()),
            self.dxx.clone().slice(range),
        )
    }
}
