//! Metadata reconciliation against on-disk artifacts.
//!
//! A package's metadata document carries denormalized state (its version
//! list, publish timestamps, dist-tag pointers, and per-file checksums)
//! that must agree with the `.tgz` artifacts actually present in the
//! package directory. [`reconcile`] recomputes all of it from disk.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::registry::{PackageMetadata, TIME_CREATED, TIME_MODIFIED};
use crate::version::{extract_version, latest_dist, sort_versions_by_recency};

use super::error::{PatchError, PatchResult};

/// Artifact extension for published package versions.
const DIST_EXTENSION: &str = ".tgz";

/// List artifact filenames in a package directory, sorted.
pub(crate) fn local_dist_files(package_dir: &Path) -> PatchResult<Vec<String>> {
    let entries = fs::read_dir(package_dir).map_err(|e| PatchError::ReadFailed {
        path: package_dir.to_path_buf(),
        source: e,
    })?;
    let mut dists: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(DIST_EXTENSION))
        .collect();
    dists.sort();
    Ok(dists)
}

/// Recompute a package's denormalized metadata from the artifacts present
/// in `package_dir`, then overwrite the document.
///
/// Keys in `versions`, `time`, `_distfiles`, and `_attachments` survive
/// only with a backing artifact; `created`/`modified` and the `latest`
/// dist-tag are recomputed from what survives. Reconciling never invents
/// versions, and running it twice changes nothing the second time.
pub fn reconcile(package_dir: &Path) -> PatchResult<()> {
    let mut meta = PackageMetadata::load(package_dir).map_err(|e| PatchError::Metadata {
        package: package_dir.to_path_buf(),
        source: e,
    })?;

    let dists = local_dist_files(package_dir)?;
    let dist_set: BTreeSet<&str> = dists.iter().map(String::as_str).collect();
    let local_versions: BTreeSet<String> = dists
        .iter()
        .filter_map(|dist| extract_version(dist))
        .collect();

    meta.versions
        .retain(|version, _| local_versions.contains(version));

    // The synthetic keys fall out of the retain and are recomputed from
    // what survived.
    meta.time
        .retain(|version, _| local_versions.contains(version));
    let ordered = sort_versions_by_recency(&meta.time);
    if let (Some(newest), Some(oldest)) = (ordered.first(), ordered.last()) {
        let modified = meta.time[newest].clone();
        let created = meta.time[oldest].clone();
        meta.time.insert(TIME_MODIFIED.to_string(), modified);
        meta.time.insert(TIME_CREATED.to_string(), created);
    }

    meta.dist_files
        .retain(|dist, _| dist_set.contains(dist.as_str()));
    meta.attachments
        .retain(|dist, _| dist_set.contains(dist.as_str()));

    // `latest` always tracks the newest artifact on disk. Other tags are
    // kept only while their version survives; a tag whose version was
    // pruned cannot be reassigned, only dropped.
    let mut tags = std::mem::take(&mut meta.dist_tags);
    tags.retain(|tag, version| tag != "latest" && meta.versions.contains_key(version));
    if let Some(newest_dist) = latest_dist(&dists)? {
        if let Some(version) = extract_version(&newest_dist) {
            tags.insert("latest".to_string(), version);
        }
    }
    meta.dist_tags = tags;

    debug!(
        package = %package_dir.display(),
        versions = meta.versions.len(),
        "reconciled metadata"
    );

    meta.store(package_dir).map_err(|e| PatchError::Metadata {
        package: package_dir.to_path_buf(),
        source: e,
    })
}
