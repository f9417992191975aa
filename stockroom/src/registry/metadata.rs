//! The registry metadata document (`package.json`).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Filename of the metadata document inside a package directory.
pub const METADATA_FILENAME: &str = "package.json";

/// Synthetic `time` key for the earliest surviving publish.
pub const TIME_CREATED: &str = "created";

/// Synthetic `time` key for the latest surviving publish.
pub const TIME_MODIFIED: &str = "modified";

/// Errors on the metadata document itself.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The document could not be read.
    #[error("failed to read metadata {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// The document is not valid JSON for this model.
    #[error("failed to parse metadata {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The document could not be serialized.
    #[error("failed to serialize metadata for '{name}': {source}")]
    Serialize {
        name: String,
        source: serde_json::Error,
    },

    /// The document could not be written back.
    #[error("failed to write metadata {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Checksum/origin record for one artifact in `_distfiles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistFile {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub registry: String,
}

/// Upload record for one artifact in `_attachments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub shasum: String,
}

/// The package metadata document.
///
/// Field set and JSON names mirror what Verdaccio persists. Version blobs
/// are opaque [`serde_json::Value`]s and never interpreted. Map fields use
/// `BTreeMap` so a rewrite always emits keys in a stable order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub versions: BTreeMap<String, serde_json::Value>,

    /// Publish timestamps per version, plus the synthetic
    /// [`TIME_CREATED`]/[`TIME_MODIFIED`] keys.
    #[serde(default)]
    pub time: BTreeMap<String, String>,

    #[serde(default)]
    pub users: serde_json::Value,

    #[serde(rename = "dist-tags", default)]
    pub dist_tags: BTreeMap<String, String>,

    #[serde(rename = "_uplinks", default)]
    pub uplinks: serde_json::Value,

    #[serde(rename = "_distfiles", default)]
    pub dist_files: BTreeMap<String, DistFile>,

    #[serde(rename = "_attachments", default)]
    pub attachments: BTreeMap<String, Attachment>,

    #[serde(rename = "_rev", default)]
    pub rev: String,

    #[serde(rename = "_id", default)]
    pub id: String,

    #[serde(default)]
    pub readme: String,
}

impl PackageMetadata {
    /// Load the metadata document from a package directory.
    pub fn load(package_dir: &Path) -> Result<Self, MetadataError> {
        let path = package_dir.join(METADATA_FILENAME);
        let content = fs::read(&path).map_err(|e| MetadataError::Read {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_slice(&content).map_err(|e| MetadataError::Parse { path, source: e })
    }

    /// Write the document back, pretty-printed with a trailing newline,
    /// replacing the previous one atomically (temp file in the same
    /// directory, then rename).
    pub fn store(&self, package_dir: &Path) -> Result<(), MetadataError> {
        let mut content = serde_json::to_vec_pretty(self).map_err(|e| MetadataError::Serialize {
            name: self.name.clone(),
            source: e,
        })?;
        content.push(b'\n');

        let path = package_dir.join(METADATA_FILENAME);
        let staged = package_dir.join(".package.json.tmp");
        fs::write(&staged, &content).map_err(|e| MetadataError::Write {
            path: staged.clone(),
            source: e,
        })?;
        fs::rename(&staged, &path).map_err(|e| MetadataError::Write { path, source: e })
    }

    /// Union `staged` into this document; staged entries win on key
    /// collision. Identity fields (`name`, `_rev`, `_id`, `readme`, ...)
    /// keep this document's values.
    pub fn merge_from(&mut self, staged: PackageMetadata) {
        self.versions.extend(staged.versions);
        self.time.extend(staged.time);
        self.dist_tags.extend(staged.dist_tags);
        self.dist_files.extend(staged.dist_files);
        self.attachments.extend(staged.attachments);
    }
}
