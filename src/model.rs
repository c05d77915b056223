use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Tanh};
use burn::prelude::Backend;
use burn::tensor::{Tensor, TensorData};

use crate::error::{PinnError, Result};
use crate::jet::Jet;

/// One learnable transform with a skip connection:
/// `out = tanh(fc2(tanh(fc1(x))) + shortcut(x))`.
///
/// The shortcut is the identity when input and output widths agree and a
/// learned projection otherwise. The activation runs inside the main
/// branch and again on the residual sum.
#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    shortcut: Option<Linear<B>>,
    activation: Tanh,
}

impl<B: Backend> ResidualBlock<B> {
    pub fn new(in_features: usize, out_features: usize, device: &B::Device) -> Self {
        let shortcut = (in_features != out_features)
            .then(|| LinearConfig::new(in_features, out_features).init(device));
        Self {
            fc1: LinearConfig::new(in_features, out_features).init(device),
            fc2: LinearConfig::new(out_features, out_features).init(device),
            shortcut,
            activation: Tanh::new(),
        }
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let residual = match &self.shortcut {
            Some(projection) => projection.forward(input.clone()),
            None => input.clone(),
        };
        let out = self.activation.forward(self.fc1.forward(input));
        let out = self.fc2.forward(out);
        self.activation.forward(out + residual)
    }

    /// Derivative-carrying twin of [`Self::forward`].
    pub fn forward_jet(&self, input: &Jet<B>) -> Jet<B> {
        let residual = match &self.shortcut {
            Some(projection) => input.linear(projection),
            None => input.clone(),
        };
        let out = input.linear(&self.fc1).tanh();
        let out = out.linear(&self.fc2);
        out.add(residual).tanh()
    }
}

/// Affine rescaling of raw (x, t) pairs into the reference square [-1, 1]².
///
/// Bounds are captured at construction and applied identically at training
/// and inference time; they carry no learnable state.
#[derive(Module, Debug)]
pub struct Normalizer<B: Backend> {
    scale: Tensor<B, 2>,
    shift: Tensor<B, 2>,
}

impl<B: Backend> Normalizer<B> {
    pub fn new(lower: [f64; 2], upper: [f64; 2], device: &B::Device) -> Result<Self> {
        for axis in 0..2 {
            if upper[axis] <= lower[axis] {
                return Err(PinnError::Config(format!(
                    "degenerate domain on axis {axis}: lb={} ub={}",
                    lower[axis], upper[axis]
                )));
            }
        }
        // X' = 2 (X - lb) / (ub - lb) - 1, written as X * scale + shift.
        // Constants go through f64 TensorData so f64 backends keep full
        // precision.
        let scale = vec![
            2.0 / (upper[0] - lower[0]),
            2.0 / (upper[1] - lower[1]),
        ];
        let shift = vec![
            -2.0 * lower[0] / (upper[0] - lower[0]) - 1.0,
            -2.0 * lower[1] / (upper[1] - lower[1]) - 1.0,
        ];
        Ok(Self {
            scale: Tensor::from_data(TensorData::new(scale, [1, 2]), device),
            shift: Tensor::from_data(TensorData::new(shift, [1, 2]), device),
        })
    }

    pub fn forward(&self, coords: Tensor<B, 2>) -> Tensor<B, 2> {
        coords * self.scale.clone() + self.shift.clone()
    }

    pub fn forward_jet(&self, jet: Jet<B>) -> Jet<B> {
        jet.affine(self.scale.clone(), self.shift.clone())
    }
}

/// Declarative width list for the residual stack, plus the domain bounds
/// the normalizer captures.
#[derive(Debug, Clone)]
pub struct FieldModelConfig {
    pub layers: Vec<usize>,
    pub lower_bound: [f64; 2],
    pub upper_bound: [f64; 2],
}

impl FieldModelConfig {
    pub fn new(layers: Vec<usize>, lower_bound: [f64; 2], upper_bound: [f64; 2]) -> Self {
        Self { layers, lower_bound, upper_bound }
    }

    /// Builds the network: input projection, `len(layers) - 3` residual
    /// blocks on the hidden width (zero when the list is that short), and
    /// an output projection with no trailing activation.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<FieldModel<B>> {
        if self.layers.len() < 2 {
            return Err(PinnError::Config(format!(
                "layer list needs at least input and output widths, got {:?}",
                self.layers
            )));
        }
        let input_dim = self.layers[0];
        let hidden_dim = self.layers[1];
        let output_dim = *self.layers.last().unwrap();
        let n_blocks = self.layers.len().saturating_sub(3);
        let blocks = (0..n_blocks)
            .map(|_| ResidualBlock::new(hidden_dim, hidden_dim, device))
            .collect();
        Ok(FieldModel {
            normalizer: Normalizer::new(self.lower_bound, self.upper_bound, device)?,
            input: LinearConfig::new(input_dim, hidden_dim).init(device),
            blocks,
            output: LinearConfig::new(hidden_dim, output_dim).init(device),
            activation: Tanh::new(),
        })
    }
}

/// The trainable surrogate: maps raw (x, t) to the real and imaginary
/// channels (u, v) of the complex field.
#[derive(Module, Debug)]
pub struct FieldModel<B: Backend> {
    normalizer: Normalizer<B>,
    input: Linear<B>,
    blocks: Vec<ResidualBlock<B>>,
    output: Linear<B>,
    activation: Tanh,
}

impl<B: Backend> FieldModel<B> {
    /// Plain forward pass: `(x, t) -> (u, v)`, each `[n, 1]`.
    pub fn forward(&self, x: Tensor<B, 2>, t: Tensor<B, 2>) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        let [n, wx] = x.dims();
        let [nt, wt] = t.dims();
        if wx != 1 || wt != 1 || n != nt {
            return Err(PinnError::DataShape(format!(
                "coordinate batches must be matching [n, 1] columns, got x: {:?}, t: {:?}",
                [n, wx],
                [nt, wt]
            )));
        }
        let coords = self.normalizer.forward(Tensor::cat(vec![x, t], 1));
        let mut hidden = self.activation.forward(self.input.forward(coords));
        for block in &self.blocks {
            hidden = block.forward(hidden);
        }
        let out = self.output.forward(hidden);
        let [_, width] = out.dims();
        if width != 2 {
            return Err(PinnError::DataShape(format!(
                "field output must have two channels (u, v), network produces {width}"
            )));
        }
        let u = out.clone().slice([0..n, 0..1]);
        let v = out.slice([0..n, 1..2]);
        Ok((u, v))
    }

    /// Forward pass carrying exact derivatives of every output channel
    /// with respect to the raw x and t inputs.
    pub fn forward_jet(&self, x: Tensor<B, 2>, t: Tensor<B, 2>) -> Result<Jet<B>> {
        let jet = Jet::seed(x, t)?;
        let jet = self.normalizer.forward_jet(jet);
        let mut jet = jet.linear(&self.input).tanh();
        for block in &self.blocks {
            jet = block.forward_jet(&jet);
        }
        Ok(jet.linear(&self.output))
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }
}
