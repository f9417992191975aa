//! Verdaccio registry integration.
//!
//! The live tree this tool patches belongs to a Verdaccio registry: one
//! directory per package holding a `package.json` document next to its
//! versioned `.tgz` artifacts, with scoped packages grouped under `@scope`
//! directories. This module owns the two touchpoints with that
//! installation: the metadata document itself and the resolution of where
//! the storage tree lives.

mod metadata;
mod storage;

pub use metadata::{
    Attachment, DistFile, MetadataError, PackageMetadata, METADATA_FILENAME, TIME_CREATED,
    TIME_MODIFIED,
};
pub use storage::{config_home, list_packages, storage_path, RegistryError, ENV_STORAGE_PATH};
