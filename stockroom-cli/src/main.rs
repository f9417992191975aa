//! Stockroom CLI - offline patch tool for a Verdaccio registry storage
//! tree.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "stockroom",
    version,
    about = "Apply offline patches to a Verdaccio registry storage tree"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply a patch archive to the registry storage
    Patch(commands::patch::PatchArgs),

    /// Reassemble uploaded fragments into a verified archive
    Reassemble(commands::reassemble::ReassembleArgs),

    /// Reconcile a package's metadata against its artifacts
    Reconcile(commands::reconcile::ReconcileArgs),

    /// List packages in the registry storage
    Packages,

    /// Print the resolved storage path
    Storage,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Patch(args) => commands::patch::run(args),
        Commands::Reassemble(args) => commands::reassemble::run(args),
        Commands::Reconcile(args) => commands::reconcile::run(args),
        Commands::Packages => commands::packages::run(),
        Commands::Storage => commands::storage::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
