//! `stockroom reconcile` - reconcile one package's metadata.

use std::path::PathBuf;

use clap::Args;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Package directory to reconcile (e.g. `<storage>/left-pad`)
    pub package: PathBuf,
}

pub fn run(args: ReconcileArgs) -> Result<(), CliError> {
    stockroom::patch::reconcile(&args.package)?;
    println!("reconciled {}", args.package.display());
    Ok(())
}
