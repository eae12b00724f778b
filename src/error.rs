//! Errors that abort a validation run

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the checker to its caller.
///
/// Probe failures never show up here; they are recorded as invalid
/// candidates. Only conditions that would silently lose a validated result
/// end a run.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Appending a validated proxy to the durable list failed.
    #[error("failed to append validated proxy to {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
