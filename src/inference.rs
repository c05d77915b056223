//! Evaluating a trained model on query grids, plus the `infer` subcommand.

use std::path::Path;
use std::time::Instant;

use burn::backend::NdArray;
use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::{Tensor, TensorData};

use crate::MODEL_FILENAME;
use crate::config::PinnConfig;
use crate::error::{PinnError, Result};
use crate::model::{FieldModel, FieldModelConfig};
use crate::pinn::residual;

/// Field and residual values on a query batch, detached from any graph.
/// The four vectors are parallel to the input points.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    pub f_u: Vec<f64>,
    pub f_v: Vec<f64>,
}

impl Prediction {
    /// `|h| = sqrt(u² + v²)` per query point.
    pub fn magnitude(&self) -> Vec<f64> {
        self.u
            .iter()
            .zip(self.v.iter())
            .map(|(u, v)| (u * u + v * v).sqrt())
            .collect()
    }
}

/// Evaluates field and residual at externally supplied (x, t) pairs.
/// Derivative tracking is re-seeded internally on fresh input tensors; the
/// model itself is not mutated.
pub fn predict<B: Backend>(
    model: &FieldModel<B>,
    points: &[[f64; 2]],
    device: &B::Device,
) -> Result<Prediction> {
    if points.is_empty() {
        return Err(PinnError::DataShape("query batch is empty".into()));
    }
    let xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
    let ts: Vec<f64> = points.iter().map(|p| p[1]).collect();
    let x = column::<B>(device, &xs);
    let t = column::<B>(device, &ts);

    let (u, v) = model.forward(x.clone(), t.clone())?;
    let (f_u, f_v) = residual(model, x, t)?;
    Ok(Prediction {
        u: to_host(u)?,
        v: to_host(v)?,
        f_u: to_host(f_u)?,
        f_v: to_host(f_v)?,
    })
}

/// Relative L2 error `‖pred − truth‖₂ / ‖truth‖₂`.
pub fn relative_l2(pred: &[f64], truth: &[f64]) -> f64 {
    let num: f64 = pred
        .iter()
        .zip(truth.iter())
        .map(|(p, t)| (p - t) * (p - t))
        .sum::<f64>()
        .sqrt();
    let den: f64 = truth.iter().map(|t| t * t).sum::<f64>().sqrt();
    num / den
}

/// Rectangular evaluation grid over the domain, row-major in t then x.
pub fn domain_grid(lb: [f64; 2], ub: [f64; 2], n_x: usize, n_t: usize) -> Vec<[f64; 2]> {
    let mut points = Vec::with_capacity(n_x * n_t);
    for i in 0..n_t {
        let t = lb[1] + (ub[1] - lb[1]) * i as f64 / (n_t - 1) as f64;
        for j in 0..n_x {
            let x = lb[0] + (ub[0] - lb[0]) * j as f64 / (n_x - 1) as f64;
            points.push([x, t]);
        }
    }
    points
}

/// Closed-form single-soliton reference `h(x, t) = sech(x)·e^{i·t/2}`.
pub fn soliton_reference(points: &[[f64; 2]]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut u = Vec::with_capacity(points.len());
    let mut v = Vec::with_capacity(points.len());
    let mut h = Vec::with_capacity(points.len());
    for p in points {
        let s = 1.0 / p[0].cosh();
        let (sin, cos) = (0.5 * p[1]).sin_cos();
        u.push(s * cos);
        v.push(s * sin);
        h.push(s);
    }
    (u, v, h)
}

fn column<B: Backend>(device: &B::Device, values: &[f64]) -> Tensor<B, 2> {
    Tensor::from_data(TensorData::new(values.to_vec(), [values.len(), 1]), device)
}

fn to_host<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<f64>> {
    tensor
        .into_data()
        .convert::<f64>()
        .to_vec()
        .map_err(|e| PinnError::DataShape(format!("tensor readback failed: {e:?}")))
}

type InferBackend = NdArray<f32>;

/// The `infer` subcommand: load the saved model, evaluate it on a grid
/// over the training domain and report relative L2 errors against the
/// closed-form soliton.
pub fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let device = Default::default();

    if !Path::new(MODEL_FILENAME).exists() {
        return Err(format!(
            "model file '{MODEL_FILENAME}' not found; run the 'train' command first"
        )
        .into());
    }

    let config = PinnConfig::new();
    config.validate()?;
    let start = Instant::now();

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let model = FieldModelConfig::new(config.layers.clone(), config.lower_bound, config.upper_bound)
        .init::<InferBackend>(&device)?
        .load_file(MODEL_FILENAME, &recorder, &device)?;

    let points = domain_grid(config.lower_bound, config.upper_bound, 101, 51);
    let prediction = predict(&model, &points, &device)?;
    let (u_star, v_star, h_star) = soliton_reference(&points);

    let error_u = relative_l2(&prediction.u, &u_star);
    let error_v = relative_l2(&prediction.v, &v_star);
    let error_h = relative_l2(&prediction.magnitude(), &h_star);
    let max_residual = prediction
        .f_u
        .iter()
        .chain(prediction.f_v.iter())
        .fold(0.0_f64, |m, r| m.max(r.abs()));

    println!("Evaluated {} grid points in {:.2?}", points.len(), start.elapsed());
    println!("Error u: {error_u:.5e}");
    println!("Error v: {error_v:.5e}");
    println!("Error h: {error_h:.5e}");
    println!("Max |residual|: {max_residual:.5e}");
    Ok(())
}
