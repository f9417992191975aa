//! Fragment concatenation and integrity verification.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Buffer size for checksum computation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Errors that can occur while reassembling uploaded fragments.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// A listed fragment could not be read.
    #[error("fragment {path} could not be read: {source}")]
    MissingFragment { path: PathBuf, source: io::Error },

    /// The reassembled file does not match the expected checksum.
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    /// The fragment directory does not exist.
    #[error("fragment directory {0} does not exist")]
    MissingStore(PathBuf),

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write the target file.
    #[error("failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to remove a consumed fragment.
    #[error("failed to remove fragment {path}: {source}")]
    RemoveFailed { path: PathBuf, source: io::Error },
}

/// Scratch directory holding uploaded fragments.
///
/// Fragment filenames carry their ordering index as the last run of
/// decimal digits in the name (`<uuid>-<index>`). Reassembly follows that
/// index numerically rather than lexically, since indices are not
/// zero-padded, and ignores submission order.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    /// Create a store over an existing fragment directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The fragment directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reassemble `fragments` into `target` and verify its checksum.
    ///
    /// Fragments are concatenated in ascending embedded-index order and
    /// each one is deleted as soon as its bytes are in the target.
    /// Reassembly is not transactional: a failure partway leaves the
    /// already-consumed fragments gone. On a checksum mismatch the
    /// (corrupt) target is left on disk; removing it is the caller's
    /// call.
    pub fn reassemble(
        &self,
        fragments: &[String],
        target: &Path,
        expected_checksum: &str,
    ) -> Result<PathBuf, ChunkError> {
        if !self.dir.is_dir() {
            return Err(ChunkError::MissingStore(self.dir.clone()));
        }

        let mut ordered = fragments.to_vec();
        ordered.sort_by_key(|name| fragment_index(name).unwrap_or(0));

        let file = File::create(target).map_err(|e| ChunkError::WriteFailed {
            path: target.to_path_buf(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);

        for name in &ordered {
            let path = self.dir.join(name);
            let bytes = fs::read(&path).map_err(|e| ChunkError::MissingFragment {
                path: path.clone(),
                source: e,
            })?;
            writer
                .write_all(&bytes)
                .map_err(|e| ChunkError::WriteFailed {
                    path: target.to_path_buf(),
                    source: e,
                })?;
            // Frees fragment storage incrementally as the target grows.
            fs::remove_file(&path).map_err(|e| ChunkError::RemoveFailed {
                path: path.clone(),
                source: e,
            })?;
        }

        writer.flush().map_err(|e| ChunkError::WriteFailed {
            path: target.to_path_buf(),
            source: e,
        })?;

        let actual = file_checksum(target)?;
        if actual != expected_checksum {
            return Err(ChunkError::IntegrityMismatch {
                filename: target
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
                expected: expected_checksum.to_string(),
                actual,
            });
        }

        Ok(target.to_path_buf())
    }
}

/// Last run of decimal digits in a fragment name, if any.
fn fragment_index(name: &str) -> Option<u64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"\d+").unwrap());
    pattern
        .find_iter(name)
        .last()
        .and_then(|digits| digits.as_str().parse().ok())
}

/// SHA-256 of a file's contents as lowercase hex.
pub fn file_checksum(path: &Path) -> Result<String, ChunkError> {
    let mut file = File::open(path).map_err(|e| ChunkError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| ChunkError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
