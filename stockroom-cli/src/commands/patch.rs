//! `stockroom patch` - apply a patch archive to the registry storage.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Args;
use console::style;
use indicatif::ProgressBar;
use tracing::info;

use stockroom::archive::extract_archive;
use stockroom::patch::{run_patch, PatchOutcome};
use stockroom::registry;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct PatchArgs {
    /// Patch archive (zip) to apply
    pub archive: PathBuf,

    /// Registry storage root; resolved from the registry config when
    /// omitted
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Keep the extracted staging tree instead of deleting it
    #[arg(long)]
    pub keep_staging: bool,
}

pub fn run(args: PatchArgs) -> Result<(), CliError> {
    let storage = match args.storage {
        Some(path) => path,
        None => registry::storage_path()?,
    };

    let staging = std::env::temp_dir().join(format!("stockroom-staging-{}", process::id()));
    fs::create_dir_all(&staging).map_err(|e| CliError::Io {
        path: staging.clone(),
        source: e,
    })?;

    let result = apply(&args.archive, &staging, &storage);

    // The staging tree is consumed by the run either way.
    if !args.keep_staging {
        let _ = fs::remove_dir_all(&staging);
    }

    result
}

fn apply(archive: &Path, staging: &Path, storage: &Path) -> Result<(), CliError> {
    info!(
        archive = %archive.display(),
        storage = %storage.display(),
        "applying patch archive"
    );
    extract_archive(archive, staging)?;
    let staging_root = staging_root(staging)?;

    let total = fs::read_dir(&staging_root)
        .map_err(|e| CliError::Io {
            path: staging_root.clone(),
            source: e,
        })?
        .count() as u64;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::RuntimeCreation)?;

    let (succeeded, failed) = runtime.block_on(async {
        let mut rx = run_patch(&staging_root, storage)?;
        let bar = ProgressBar::new(total);
        let mut succeeded = 0u64;
        let mut failed = 0u64;

        while let Some(event) = rx.recv().await {
            bar.set_position(event.progress);
            match event.outcome {
                PatchOutcome::Success => {
                    succeeded += 1;
                    bar.println(format!("{} {}", style("patched").green(), event.package));
                }
                PatchOutcome::Failed { error } => {
                    failed += 1;
                    bar.println(format!(
                        "{} {}: {}",
                        style("failed").red(),
                        event.package,
                        error
                    ));
                }
            }
        }
        bar.finish_and_clear();

        Ok::<_, CliError>((succeeded, failed))
    })?;

    println!("{} package(s) patched, {} failed", succeeded, failed);
    Ok(())
}

/// Patch archives usually wrap their content in a single top-level
/// directory; descend into it when that is the case.
fn staging_root(staging: &Path) -> Result<PathBuf, CliError> {
    let entries: Vec<_> = fs::read_dir(staging)
        .map_err(|e| CliError::Io {
            path: staging.to_path_buf(),
            source: e,
        })?
        .filter_map(Result::ok)
        .collect();

    if entries.len() == 1 && entries[0].path().is_dir() {
        Ok(entries[0].path())
    } else {
        Ok(staging.to_path_buf())
    }
}
