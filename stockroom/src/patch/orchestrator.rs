//! Concurrent fan-out of a patch run.

use std::fs;
use std::path::Path;

use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, warn};

use super::error::{PatchError, PatchResult};
use super::merger;

/// Channel capacity for the event stream.
const EVENT_BUFFER: usize = 32;

/// Outcome of one package's merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Success,
    Failed { error: String },
}

/// One event per completed top-level merge attempt.
///
/// `progress` counts completed attempts regardless of outcome; the stream
/// carries each value in `1..=total` exactly once, in order. `total` is
/// fixed before any work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEvent {
    pub package: String,
    pub outcome: PatchOutcome,
    pub progress: u64,
    pub total: u64,
}

impl PatchEvent {
    /// Whether this is the final event of the run.
    pub fn is_last(&self) -> bool {
        self.progress == self.total
    }
}

/// Merge every top-level entry of `staging_root` into `live_root`,
/// streaming one [`PatchEvent`] per entry.
///
/// Each entry runs as its own blocking task with no ordering between
/// entries; a failed merge becomes a `Failed` event and never stops the
/// others, and nothing is retried. Completions funnel through a single
/// aggregating task that owns the progress counter, so the receiver sees
/// exactly one event per entry and the channel closes after the last.
/// Enumeration failure of the staging root aborts the run up front
/// instead.
///
/// Must be called from within a Tokio runtime. The staged tree belongs to
/// this run until the stream ends; concurrent runs over the same staging
/// root are not supported.
pub fn run_patch(
    staging_root: &Path,
    live_root: &Path,
) -> PatchResult<mpsc::Receiver<PatchEvent>> {
    let entries = fs::read_dir(staging_root).map_err(|e| PatchError::ReadFailed {
        path: staging_root.to_path_buf(),
        source: e,
    })?;
    let names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();

    let total = names.len() as u64;
    let (done_tx, mut done_rx) = mpsc::channel(EVENT_BUFFER);
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

    debug!(total, staging = %staging_root.display(), "dispatching patch run");

    for name in names {
        let staged = staging_root.join(&name);
        let live = live_root.join(&name);
        let done_tx = done_tx.clone();

        task::spawn_blocking(move || {
            let outcome = match merger::merge(&staged, &live) {
                Ok(()) => PatchOutcome::Success,
                Err(e) => {
                    warn!(package = %name, error = %e, "package merge failed");
                    PatchOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            // A refused send means the aggregator is gone because the
            // caller abandoned the run; nothing left to report then.
            let _ = done_tx.blocking_send((name, outcome));
        });
    }
    drop(done_tx);

    task::spawn(async move {
        let mut progress = 0u64;
        while let Some((package, outcome)) = done_rx.recv().await {
            progress += 1;
            let event = PatchEvent {
                package,
                outcome,
                progress,
                total,
            };
            // A caller may have stopped reading; nothing left to do then.
            if event_tx.send(event).await.is_err() {
                break;
            }
        }
    });

    Ok(event_rx)
}
