//! CLI command implementations, one module per subcommand.

pub mod packages;
pub mod patch;
pub mod reassemble;
pub mod reconcile;
pub mod storage;
