use thiserror::Error;

pub type Result<T> = std::result::Result<T, PinnError>;

/// Failure conditions of the PINN core.
///
/// Configuration problems surface at construction, before any compute is
/// spent; shape and differentiation problems surface at the offending
/// operation; divergence aborts the training loop.
#[derive(Debug, Error)]
pub enum PinnError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("tensor shape mismatch: {0}")]
    DataShape(String),

    #[error(
        "training diverged at iteration {iteration}{}",
        .last_loss.map(|l| format!(" (last finite loss: {l:.5e})")).unwrap_or_default()
    )]
    Divergence {
        iteration: usize,
        /// Last finite loss seen, if any iteration completed with one.
        last_loss: Option<f64>,
    },

    #[error("derivative computation failed: {0}")]
    Differentiation(String),
}
