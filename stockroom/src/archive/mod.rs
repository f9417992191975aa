//! Patch archive extraction.
//!
//! Uploaded patches are zip bundles. [`extract_archive`] expands every
//! regular-file entry under a destination root, recreating directory
//! structure through file parents. Entry paths are validated against
//! traversal before anything touches disk.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

/// Errors that can occur while extracting a patch archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file could not be opened.
    #[error("failed to open archive {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// The archive is not a readable zip bundle.
    #[error("failed to read archive {path}: {source}")]
    Malformed { path: PathBuf, source: ZipError },

    /// An entry's resolved path would escape the destination root.
    #[error("archive entry '{entry}' escapes the extraction root")]
    PathTraversal { entry: String },

    /// An individual entry failed to extract.
    #[error("failed to extract '{entry}': {reason}")]
    Extraction { entry: String, reason: String },
}

/// Expand every regular-file entry of `archive` under `dest_root`.
///
/// Directory entries are skipped after the escape check; their structure
/// is recreated through the parents of file entries. The first failing
/// entry aborts the run, which can leave a partial extraction behind;
/// cleanup is the caller's responsibility.
pub fn extract_archive(archive: &Path, dest_root: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive).map_err(|e| ArchiveError::Open {
        path: archive.to_path_buf(),
        source: e,
    })?;
    let mut bundle = ZipArchive::new(file).map_err(|e| ArchiveError::Malformed {
        path: archive.to_path_buf(),
        source: e,
    })?;

    for index in 0..bundle.len() {
        let mut entry = bundle.by_index(index).map_err(|e| ArchiveError::Malformed {
            path: archive.to_path_buf(),
            source: e,
        })?;
        let name = entry.name().to_string();

        // The escape check comes before any write for the entry,
        // directory entries included.
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(ArchiveError::PathTraversal { entry: name });
        };
        let dest = dest_root.join(relative);

        if entry.is_dir() {
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ArchiveError::Extraction {
                entry: name.clone(),
                reason: format!("failed to create {}: {}", parent.display(), e),
            })?;
        }

        let mut out = File::create(&dest).map_err(|e| ArchiveError::Extraction {
            entry: name.clone(),
            reason: format!("failed to create {}: {}", dest.display(), e),
        })?;
        io::copy(&mut entry, &mut out).map_err(|e| ArchiveError::Extraction {
            entry: name,
            reason: e.to_string(),
        })?;
    }

    Ok(())
}
