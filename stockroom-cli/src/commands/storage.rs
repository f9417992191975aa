//! `stockroom storage` - print the resolved storage path.

use stockroom::registry;

use crate::error::CliError;

pub fn run() -> Result<(), CliError> {
    println!("{}", registry::storage_path()?.display());
    Ok(())
}
