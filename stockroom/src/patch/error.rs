//! Error types for the patch engine.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::registry::MetadataError;
use crate::version::VersionError;

/// Result type for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors that can occur while merging and reconciling packages.
#[derive(Debug)]
pub enum PatchError {
    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to copy a staged entry into the live tree.
    CopyFailed { path: PathBuf, source: io::Error },

    /// A package's metadata document failed to load or persist.
    Metadata {
        package: PathBuf,
        source: MetadataError,
    },

    /// Artifact version ordering failed.
    Version(VersionError),

    /// A package merge failed, with the package path for context.
    Merge {
        package: String,
        source: Box<PatchError>,
    },
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::CopyFailed { path, source } => {
                write!(f, "failed to copy {}: {}", path.display(), source)
            }
            Self::Metadata { package, source } => {
                write!(f, "metadata failure in {}: {}", package.display(), source)
            }
            Self::Version(source) => write!(f, "version ordering failed: {}", source),
            Self::Merge { package, source } => {
                write!(f, "failed to patch package [{}]: {}", package, source)
            }
        }
    }
}

impl std::error::Error for PatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            Self::CopyFailed { source, .. } => Some(source),
            Self::Metadata { source, .. } => Some(source),
            Self::Version(source) => Some(source),
            Self::Merge { source, .. } => Some(source.as_ref()),
        }
    }
}

impl From<VersionError> for PatchError {
    fn from(source: VersionError) -> Self {
        Self::Version(source)
    }
}
