//! # Physics-informed neural network for the 1-D cubic Schrödinger equation
//!
//! Trains a residual-block network on the `burn` framework so that the
//! complex field `h = u + i·v` it predicts satisfies the nonlinear
//! Schrödinger equation `i·h_t + 0.5·h_xx + |h|²·h = 0` over a rectangular
//! (x, t) domain, supervised only by the initial time slice and by the PDE
//! residual at collocation points.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod inference;
pub mod jet;
pub mod model;
pub mod pinn;
pub mod sampling;
pub mod training;

/// File name the trained model is saved under.
pub const MODEL_FILENAME: &str = "nls_pinn_model.mpk";
