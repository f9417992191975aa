//! Storage tree location and listing.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable overriding the resolved storage path.
pub const ENV_STORAGE_PATH: &str = "VERDACCIO_STORAGE_PATH";

/// Directory under the user config root holding the registry's files.
const APP_DIRNAME: &str = "verdaccio";

/// The registry configuration document inside [`config_home`].
const CONFIG_FILE: &str = "config.yaml";

/// Errors while locating or listing the registry storage.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No config base directory could be resolved.
    #[error("neither $XDG_CONFIG_HOME nor a home directory could be resolved")]
    HomeNotFound,

    /// The registry config document could not be read.
    #[error("failed to read registry config {path}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    /// The registry config document could not be parsed.
    #[error("failed to parse registry config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The resolved storage path is not present on disk.
    #[error("storage path does not exist: {0}")]
    StorageMissing(PathBuf),

    /// The storage directory could not be listed.
    #[error("failed to read storage directory {path}: {source}")]
    StorageRead { path: PathBuf, source: io::Error },
}

/// The subset of the registry's `config.yaml` this tool reads.
#[derive(Debug, Deserialize)]
struct RegistryConfig {
    #[serde(default)]
    storage: String,
}

/// The registry's configuration directory.
///
/// `$XDG_CONFIG_HOME/verdaccio` when the variable is set, else
/// `~/.config/verdaccio`.
pub fn config_home() -> Result<PathBuf, RegistryError> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .ok_or(RegistryError::HomeNotFound)?;
    Ok(base.join(APP_DIRNAME))
}

/// Resolve the live storage root.
///
/// [`ENV_STORAGE_PATH`] wins when set and non-empty; otherwise the
/// `storage` key of the registry's `config.yaml`, taken as-is when
/// absolute and relative to [`config_home`] otherwise. The resolved path
/// must exist.
pub fn storage_path() -> Result<PathBuf, RegistryError> {
    let resolved = match env::var_os(ENV_STORAGE_PATH).filter(|value| !value.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => storage_path_from_config(&config_home()?)?,
    };
    if !resolved.exists() {
        return Err(RegistryError::StorageMissing(resolved));
    }
    Ok(resolved)
}

/// Resolve the storage root from the config document under `home`.
fn storage_path_from_config(home: &Path) -> Result<PathBuf, RegistryError> {
    let path = home.join(CONFIG_FILE);
    let content = fs::read(&path).map_err(|e| RegistryError::ConfigRead {
        path: path.clone(),
        source: e,
    })?;
    let config: RegistryConfig =
        serde_yaml::from_slice(&content).map_err(|e| RegistryError::ConfigParse { path, source: e })?;

    let storage = PathBuf::from(&config.storage);
    if storage.is_absolute() {
        Ok(storage)
    } else {
        Ok(home.join(storage))
    }
}

/// List top-level package and scope names in the storage root.
pub fn list_packages(storage_root: &Path) -> Result<Vec<String>, RegistryError> {
    let entries = fs::read_dir(storage_root).map_err(|e| RegistryError::StorageRead {
        path: storage_root.to_path_buf(),
        source: e,
    })?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}
