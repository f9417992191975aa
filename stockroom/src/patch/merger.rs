//! Merging staged package trees into live storage.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::registry::{MetadataError, PackageMetadata, METADATA_FILENAME};

use super::error::{PatchError, PatchResult};
use super::reconciler;

/// What a staged entry is, decided before any merge logic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    /// A scope directory (`@scope`) grouping packages; recursed into.
    Namespace,
    /// A candidate package directory.
    Package,
    /// Not a directory, or colliding with a non-directory live entry.
    Unrelated,
}

fn classify(staged: &Path, live: &Path) -> EntryKind {
    if !staged.is_dir() {
        return EntryKind::Unrelated;
    }
    if live.exists() && !live.is_dir() {
        return EntryKind::Unrelated;
    }
    let scoped = staged
        .file_name()
        .map(|name| name.to_string_lossy().starts_with('@'))
        .unwrap_or(false);
    if scoped {
        EntryKind::Namespace
    } else {
        EntryKind::Package
    }
}

/// Merge one staged entry into the live tree.
///
/// Scope directories are namespaces, not packages: each child is merged
/// independently and one child's failure does not stop its siblings.
/// Unrelated entries are ignored. Package failures come back wrapped with
/// the staged package path for context.
pub fn merge(staged: &Path, live: &Path) -> PatchResult<()> {
    match classify(staged, live) {
        EntryKind::Unrelated => Ok(()),
        EntryKind::Namespace => merge_namespace(staged, live),
        EntryKind::Package => merge_package(staged, live).map_err(|e| PatchError::Merge {
            package: staged.display().to_string(),
            source: Box::new(e),
        }),
    }
}

fn merge_namespace(staged: &Path, live: &Path) -> PatchResult<()> {
    let entries = fs::read_dir(staged).map_err(|e| PatchError::ReadFailed {
        path: staged.to_path_buf(),
        source: e,
    })?;
    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name();
        if let Err(e) = merge(&staged.join(&name), &live.join(&name)) {
            warn!(
                package = %name.to_string_lossy(),
                error = %e,
                "failed to patch scoped package"
            );
        }
    }
    Ok(())
}

fn merge_package(staged: &Path, live: &Path) -> PatchResult<()> {
    if live.exists() {
        debug!(live = %live.display(), "merging into existing package");
        let staged_meta = load_metadata(staged)?;
        let mut live_meta = load_metadata(live)?;
        live_meta.merge_from(staged_meta);
        live_meta.store(live).map_err(|e| PatchError::Metadata {
            package: live.to_path_buf(),
            source: e,
        })?;
        copy_missing_artifacts(staged, live)?;
    } else {
        debug!(live = %live.display(), "copying new package");
        copy_dir_recursive(staged, live)?;
    }
    reconcile_entry(live)
}

fn load_metadata(dir: &Path) -> PatchResult<PackageMetadata> {
    PackageMetadata::load(dir).map_err(|e| PatchError::Metadata {
        package: dir.to_path_buf(),
        source: e,
    })
}

/// Copy every staged artifact the live package does not have yet.
///
/// The metadata document is excluded (it was already merged) and
/// existing live files are never overwritten.
fn copy_missing_artifacts(staged: &Path, live: &Path) -> PatchResult<()> {
    let entries = fs::read_dir(staged).map_err(|e| PatchError::ReadFailed {
        path: staged.to_path_buf(),
        source: e,
    })?;
    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name();
        if name == METADATA_FILENAME {
            continue;
        }
        let source = entry.path();
        let dest = live.join(&name);
        if dest.exists() {
            continue;
        }
        if source.is_dir() {
            copy_dir_recursive(&source, &dest)?;
        } else {
            fs::copy(&source, &dest).map_err(|e| PatchError::CopyFailed {
                path: dest,
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Recursively copy a directory.
fn copy_dir_recursive(source: &Path, dest: &Path) -> PatchResult<()> {
    fs::create_dir_all(dest).map_err(|e| PatchError::CreateDirFailed {
        path: dest.to_path_buf(),
        source: e,
    })?;

    for entry in fs::read_dir(source).map_err(|e| PatchError::ReadFailed {
        path: source.to_path_buf(),
        source: e,
    })? {
        let entry = entry.map_err(|e| PatchError::ReadFailed {
            path: source.to_path_buf(),
            source: e,
        })?;

        let source_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if source_path.is_dir() {
            copy_dir_recursive(&source_path, &dest_path)?;
        } else {
            fs::copy(&source_path, &dest_path).map_err(|e| PatchError::CopyFailed {
                path: dest_path,
                source: e,
            })?;
        }
    }

    Ok(())
}

/// Reconcile a merged entry.
///
/// A directory without a parsable metadata document is not a package
/// itself; its child directories are reconciled instead, each failure
/// logged without stopping the rest.
fn reconcile_entry(path: &Path) -> PatchResult<()> {
    match reconciler::reconcile(path) {
        Err(PatchError::Metadata {
            source: MetadataError::Read { .. } | MetadataError::Parse { .. },
            ..
        }) if path.is_dir() => {
            let entries = fs::read_dir(path).map_err(|e| PatchError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
            for entry in entries.filter_map(Result::ok) {
                let child = entry.path();
                if !child.is_dir() {
                    continue;
                }
                if let Err(e) = reconcile_entry(&child) {
                    warn!(
                        package = %child.display(),
                        error = %e,
                        "failed to reconcile nested package"
                    );
                }
            }
            Ok(())
        }
        other => other,
    }
}
