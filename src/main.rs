use clap::Parser;
use nls_pinn::cli::{Cli, Commands};
use nls_pinn::{inference, training};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train { iterations } => training::run(iterations),
        Commands::Infer => inference::run(),
    }
}
