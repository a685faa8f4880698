//! Fatal error taxonomy for pin runs.
//!
//! Non-fatal conditions (prefetch failures, GC root failures) are not
//! errors: they surface as report warnings and the run still succeeds.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a pin run with a non-zero exit.
#[derive(Debug, Error)]
pub enum PinError {
    /// The lock file could not be read or parsed.
    #[error("unable to open lock file {}: {reason}", .path.display())]
    LockFile { path: PathBuf, reason: String },

    /// The named entry is absent from the lock file's nodes.
    #[error("no entry named '{entry}' found in {}", .path.display())]
    EntryNotFound { entry: String, path: PathBuf },

    /// The registry file could not be written.
    #[error("unable to write registry file {}: {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },
}
