//! `stockroom reassemble` - rebuild an uploaded archive from fragments.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use stockroom::chunk::ChunkStore;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ReassembleArgs {
    /// Output file for the reassembled archive
    pub output: PathBuf,

    /// Fragment filenames; every file in the fragment directory when
    /// omitted
    pub fragments: Vec<String>,

    /// Expected SHA-256 checksum of the reassembled file (lowercase hex)
    #[arg(long)]
    pub checksum: String,

    /// Directory holding the uploaded fragments
    #[arg(long, default_value = "chunk")]
    pub chunk_dir: PathBuf,
}

pub fn run(args: ReassembleArgs) -> Result<(), CliError> {
    let fragments = if args.fragments.is_empty() {
        list_fragments(&args.chunk_dir)?
    } else {
        args.fragments
    };

    let store = ChunkStore::new(&args.chunk_dir);
    let path = store.reassemble(&fragments, &args.output, &args.checksum)?;

    println!(
        "reassembled {} fragment(s) into {}",
        fragments.len(),
        path.display()
    );
    Ok(())
}

fn list_fragments(chunk_dir: &Path) -> Result<Vec<String>, CliError> {
    let entries = fs::read_dir(chunk_dir).map_err(|e| CliError::Io {
        path: chunk_dir.to_path_buf(),
        source: e,
    })?;
    Ok(entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect())
}
