//! CLI error type.

use std::fmt;
use std::io;
use std::path::PathBuf;

use stockroom::archive::ArchiveError;
use stockroom::chunk::ChunkError;
use stockroom::patch::PatchError;
use stockroom::registry::RegistryError;

/// Errors surfaced to the terminal.
#[derive(Debug)]
pub enum CliError {
    /// Registry configuration or storage lookup failed.
    Registry(RegistryError),

    /// Fragment reassembly failed.
    Chunk(ChunkError),

    /// Archive extraction failed.
    Archive(ArchiveError),

    /// The patch run could not be started or a reconcile failed.
    Patch(PatchError),

    /// Failed to create the Tokio runtime.
    RuntimeCreation(io::Error),

    /// Filesystem housekeeping around a command failed.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Registry(e) => write!(f, "{}", e),
            CliError::Chunk(e) => write!(f, "{}", e),
            CliError::Archive(e) => write!(f, "{}", e),
            CliError::Patch(e) => write!(f, "{}", e),
            CliError::RuntimeCreation(e) => {
                write!(f, "failed to create Tokio runtime: {}", e)
            }
            CliError::Io { path, source } => {
                write!(f, "failed to access {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Registry(e) => Some(e),
            CliError::Chunk(e) => Some(e),
            CliError::Archive(e) => Some(e),
            CliError::Patch(e) => Some(e),
            CliError::RuntimeCreation(e) => Some(e),
            CliError::Io { source, .. } => Some(source),
        }
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Registry(e)
    }
}

impl From<ChunkError> for CliError {
    fn from(e: ChunkError) -> Self {
        CliError::Chunk(e)
    }
}

impl From<ArchiveError> for CliError {
    fn from(e: ArchiveError) -> Self {
        CliError::Archive(e)
    }
}

impl From<PatchError> for CliError {
    fn from(e: PatchError) -> Self {
        CliError::Patch(e)
    }
}
