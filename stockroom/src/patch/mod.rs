//! The patch engine: merging a staged tree of package updates into live
//! registry storage.
//!
//! A patch run walks the staged tree's top-level entries, merges each into
//! the live tree ([`merge`]), and reconciles every touched metadata
//! document against the artifacts actually on disk ([`reconcile`]). The
//! orchestrator ([`run_patch`]) fans the top-level entries out to
//! concurrent tasks and streams one [`PatchEvent`] per entry back to the
//! caller; a failed package is an event, never a failed run.

mod error;
mod merger;
mod orchestrator;
mod reconciler;

pub use error::{PatchError, PatchResult};
pub use merger::merge;
pub use orchestrator::{run_patch, PatchEvent, PatchOutcome};
pub use reconciler::reconcile;
