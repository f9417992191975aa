//! Stockroom - offline patching for a Verdaccio registry storage tree.
//!
//! A registry's storage is one directory per package: a `package.json`
//! metadata document next to versioned `.tgz` artifacts, with scoped
//! packages grouped under `@scope` directories. Stockroom takes a patch
//! archive produced on a connected machine (uploaded in fragments, then
//! reassembled and verified) and folds the packages it stages into that
//! live tree, keeping every metadata document consistent with the
//! artifacts actually on disk.
//!
//! The pipeline, in the order a patch run uses it:
//!
//! 1. [`chunk`] rebuilds the uploaded archive from its fragments.
//! 2. [`archive`] expands it into a staging tree.
//! 3. [`patch`] merges staged packages into live storage concurrently,
//!    reconciles their metadata, and streams per-package progress events.
//!
//! [`version`] supplies the filename and ordering rules those stages
//! share, and [`registry`] owns the metadata document model and the
//! storage tree's location.

pub mod archive;
pub mod chunk;
pub mod patch;
pub mod registry;
pub mod version;
