//! The training loop: full-batch Adam over the composite loss for a fixed
//! iteration budget, with per-iteration divergence detection and periodic
//! diagnostics.

use std::time::Instant;

use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::ElementConversion;
use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::AutodiffBackend;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::MODEL_FILENAME;
use crate::config::PinnConfig;
use crate::diagnostics::{
    DiagnosticsSink, IterationReport, StdoutDiagnostics, TrainingSummary, resident_memory_mb,
};
use crate::error::{PinnError, Result};
use crate::model::{FieldModel, FieldModelConfig};
use crate::pinn::total_loss;
use crate::sampling;

/// Immutable sample bundle the loss reads every iteration: the supervised
/// initial slice (`x0`, `t0`, `u0`, `v0`) and the unsupervised collocation
/// interior (`x_f`, `t_f`). All columns `[n, 1]`.
#[derive(Debug, Clone)]
pub struct TrainingData<B: Backend> {
    pub x0: Tensor<B, 2>,
    pub t0: Tensor<B, 2>,
    pub u0: Tensor<B, 2>,
    pub v0: Tensor<B, 2>,
    pub x_f: Tensor<B, 2>,
    pub t_f: Tensor<B, 2>,
}

impl<B: Backend> TrainingData<B> {
    pub fn new(
        x0: Tensor<B, 2>,
        t0: Tensor<B, 2>,
        u0: Tensor<B, 2>,
        v0: Tensor<B, 2>,
        x_f: Tensor<B, 2>,
        t_f: Tensor<B, 2>,
    ) -> Result<Self> {
        let n0 = x0.dims()[0];
        let n_f = x_f.dims()[0];
        for (name, tensor, rows) in [
            ("x0", &x0, n0),
            ("t0", &t0, n0),
            ("u0", &u0, n0),
            ("v0", &v0, n0),
            ("x_f", &x_f, n_f),
            ("t_f", &t_f, n_f),
        ] {
            if tensor.dims() != [rows, 1] {
                return Err(PinnError::DataShape(format!(
                    "{name} must be [{rows}, 1], got {:?}",
                    tensor.dims()
                )));
            }
        }
        if n0 == 0 || n_f == 0 {
            return Err(PinnError::DataShape(
                "initial-condition and collocation batches must be non-empty".into(),
            ));
        }
        Ok(Self { x0, t0, u0, v0, x_f, t_f })
    }

    /// Assembles the bundle from host-side samples: initial positions with
    /// their (u, v) values pinned to the fixed initial time `t_initial`,
    /// plus space-filling collocation pairs.
    pub fn from_samples(
        device: &B::Device,
        x0: &[f64],
        u0: &[f64],
        v0: &[f64],
        t_initial: f64,
        collocation: &[[f64; 2]],
    ) -> Result<Self> {
        if x0.len() != u0.len() || x0.len() != v0.len() {
            return Err(PinnError::DataShape(format!(
                "initial-condition columns disagree: {} positions, {} u values, {} v values",
                x0.len(),
                u0.len(),
                v0.len()
            )));
        }
        let n0 = x0.len();
        let t0 = vec![t_initial; n0];
        let x_f: Vec<f64> = collocation.iter().map(|p| p[0]).collect();
        let t_f: Vec<f64> = collocation.iter().map(|p| p[1]).collect();
        Self::new(
            column(device, x0),
            column(device, &t0),
            column(device, u0),
            column(device, v0),
            column(device, &x_f),
            column(device, &t_f),
        )
    }
}

fn column<B: Backend>(device: &B::Device, values: &[f64]) -> Tensor<B, 2> {
    Tensor::from_data(TensorData::new(values.to_vec(), [values.len(), 1]), device)
}

/// Drives the optimization: forward, loss, backward, Adam step, repeated
/// for the fixed budget. No adaptive stopping and no checkpointing; the
/// only early exit is the divergence guard.
pub struct Trainer {
    pub iterations: usize,
    pub learning_rate: f64,
    pub report_every: usize,
}

impl Trainer {
    pub fn new(iterations: usize, learning_rate: f64) -> Self {
        Self { iterations, learning_rate, report_every: 100 }
    }

    /// Runs the loop to completion and returns the trained model, or a
    /// [`PinnError::Divergence`] naming the iteration at which the loss
    /// stopped being finite and the last finite value seen.
    pub fn train<B: AutodiffBackend>(
        &self,
        mut model: FieldModel<B>,
        data: &TrainingData<B>,
        sink: &mut impl DiagnosticsSink,
    ) -> Result<FieldModel<B>> {
        let mut optim = AdamConfig::new().init::<B, FieldModel<B>>();
        let start = Instant::now();
        let mut last_loss: Option<f64> = None;
        let mut peak_memory_mb: Option<f64> = None;

        for iteration in 0..self.iterations {
            let loss = total_loss(&model, data)?;
            let loss_value: f64 = loss.clone().into_scalar().elem();
            if !loss_value.is_finite() {
                return Err(PinnError::Divergence { iteration, last_loss });
            }
            last_loss = Some(loss_value);

            if iteration % self.report_every == 0 {
                let resident = resident_memory_mb();
                if let Some(mb) = resident {
                    peak_memory_mb = Some(peak_memory_mb.map_or(mb, |p: f64| p.max(mb)));
                }
                sink.report(&IterationReport {
                    iteration,
                    loss: loss_value,
                    elapsed: start.elapsed(),
                    resident_memory_mb: resident,
                });
            }

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(self.learning_rate, model, grads);
        }

        sink.summary(&TrainingSummary {
            iterations_run: self.iterations,
            final_loss: last_loss.unwrap_or(f64::NAN),
            total_time: start.elapsed(),
            peak_memory_mb,
        });
        Ok(model)
    }
}

/// The single-soliton initial slice `h(x, 0) = sech(x)`; its exact
/// evolution is `sech(x)·e^{i·t/2}`.
pub fn soliton_initial_field(x: f64) -> (f64, f64) {
    (1.0 / x.cosh(), 0.0)
}

type TrainBackend = Autodiff<NdArray<f32>>;

/// The `train` subcommand: sample the problem, train with the configured
/// budget and save the model record.
pub fn run(iterations_override: Option<usize>) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut config = PinnConfig::new();
    if let Some(iterations) = iterations_override {
        config = config.with_iterations(iterations);
    }
    config.validate()?;

    let device = Default::default();
    TrainBackend::seed(config.seed);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let (x0, u0, v0) = sampling::initial_condition_samples(
        &mut rng,
        config.n_initial,
        config.lower_bound[0],
        config.upper_bound[0],
        soliton_initial_field,
    );
    let tb = sampling::boundary_times(
        &mut rng,
        config.n_boundary,
        config.lower_bound[1],
        config.upper_bound[1],
    );
    let collocation = sampling::latin_hypercube(
        &mut rng,
        config.n_collocation,
        config.lower_bound,
        config.upper_bound,
    );
    let data = TrainingData::<TrainBackend>::from_samples(
        &device,
        &x0,
        &u0,
        &v0,
        config.lower_bound[1],
        &collocation,
    )?;

    let model = FieldModelConfig::new(config.layers.clone(), config.lower_bound, config.upper_bound)
        .init::<TrainBackend>(&device)?;

    println!(
        "Training NLS PINN: {} initial samples, {} collocation points, {} boundary times (no boundary loss), {} iterations",
        config.n_initial,
        config.n_collocation,
        tb.len(),
        config.iterations
    );

    let trainer = Trainer::new(config.iterations, config.learning_rate);
    let model = trainer.train(model, &data, &mut StdoutDiagnostics)?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model.save_file(MODEL_FILENAME, &recorder)?;
    println!("Model saved to '{MODEL_FILENAME}'");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullDiagnostics;

    type F64Backend = Autodiff<NdArray<f64>>;

    fn tiny_problem<B: Backend>(
        device: &B::Device,
        seed: u64,
    ) -> (FieldModel<B>, TrainingData<B>) {
        let lb = [-5.0, 0.0];
        let ub = [5.0, std::f64::consts::FRAC_PI_2];
        let mut rng = StdRng::seed_from_u64(seed);
        let (x0, u0, v0) =
            sampling::initial_condition_samples(&mut rng, 16, lb[0], ub[0], soliton_initial_field);
        let collocation = sampling::latin_hypercube(&mut rng, 32, lb, ub);
        let data = TrainingData::from_samples(device, &x0, &u0, &v0, lb[1], &collocation).unwrap();
        let model = FieldModelConfig::new(vec![2, 16, 16, 2], lb, ub)
            .init::<B>(device)
            .unwrap();
        (model, data)
    }

    #[test]
    fn short_training_improves_the_loss() {
        let device = Default::default();
        let (model, data) = tiny_problem::<F64Backend>(&device, 3);
        let before: f64 = total_loss(&model, &data).unwrap().into_scalar().elem();
        let trainer = Trainer::new(200, 3e-3);
        let trained = trainer.train(model, &data, &mut NullDiagnostics).unwrap();
        let after: f64 = total_loss(&trained, &data).unwrap().into_scalar().elem();
        assert!(after.is_finite() && before.is_finite());
        assert!(after < before, "loss did not improve: {before} -> {after}");
    }

    #[test]
    fn pathological_learning_rate_triggers_divergence() {
        let device = Default::default();
        let (model, data) = tiny_problem::<TrainBackend>(&device, 5);
        let trainer = Trainer::new(50, 1e6);
        match trainer.train(model, &data, &mut NullDiagnostics) {
            Err(PinnError::Divergence { iteration, .. }) => {
                assert!(iteration < 50, "divergence flagged too late: {iteration}");
            }
            Err(other) => panic!("expected Divergence, got {other}"),
            Ok(_) => panic!("training with lr=1e6 should diverge"),
        }
    }

    #[test]
    fn divergence_before_any_finite_loss_carries_no_loss_value() {
        // NaN in the supervised values makes the very first loss non-finite.
        let device = Default::default();
        let lb = [-1.0, 0.0];
        let ub = [1.0, 1.0];
        let data = TrainingData::<F64Backend>::from_samples(
            &device,
            &[0.0, 0.5],
            &[f64::NAN, 1.0],
            &[0.0, 0.0],
            lb[1],
            &[[0.0, 0.5], [0.5, 0.2]],
        )
        .unwrap();
        let model = FieldModelConfig::new(vec![2, 4, 2], lb, ub)
            .init::<F64Backend>(&device)
            .unwrap();
        match Trainer::new(5, 1e-3).train(model, &data, &mut NullDiagnostics) {
            Err(PinnError::Divergence { iteration, last_loss }) => {
                assert_eq!(iteration, 0);
                assert!(last_loss.is_none());
            }
            other => panic!("expected immediate divergence, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_sample_columns_are_rejected() {
        let device: <NdArray<f64> as Backend>::Device = Default::default();
        let result = TrainingData::<NdArray<f64>>::from_samples(
            &device,
            &[0.0, 1.0],
            &[1.0],
            &[0.0, 0.0],
            0.0,
            &[[0.0, 0.5]],
        );
        assert!(matches!(result, Err(PinnError::DataShape(_))));
    }
}
