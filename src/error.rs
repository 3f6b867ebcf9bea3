//! Fatal run errors.
//!
//! Test failures and infrastructure errors are tallied per test and never
//! surface here. A `RunError` means the runner itself could not continue:
//! no suite report is produced and the caller is expected to stop.

use std::io;

/// Errors that abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to create status pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("Failed to fork isolated child: {0}")]
    Fork(#[source] io::Error),

    #[error("Failed to wait for child {pid}: {source}")]
    Wait {
        pid: i32,
        #[source]
        source: io::Error,
    },

    #[error("Failed to kill timed out child {pid}: {source}")]
    Kill {
        pid: i32,
        #[source]
        source: io::Error,
    },
}
