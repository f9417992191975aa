//! `stockroom packages` - list packages in the registry storage.

use stockroom::registry;

use crate::error::CliError;

pub fn run() -> Result<(), CliError> {
    let storage = registry::storage_path()?;
    for name in registry::list_packages(&storage)? {
        println!("{}", name);
    }
    Ok(())
}
