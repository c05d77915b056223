use clap::{Parser, Subcommand};

/// Command-line surface: `train` fits the model, `infer` evaluates a
/// saved one.
#[derive(Parser, Debug)]
#[command(author, version, about = "Physics-informed neural network for the 1-D cubic Schrödinger equation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the PINN and save the model record
    Train {
        /// Override the configured iteration budget
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Evaluate the saved model on a domain grid and report errors
    Infer,
}
