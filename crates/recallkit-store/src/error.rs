//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors specific to the result store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The results root exists but is a file.
    #[error("results path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A report cannot be filed without a participant name.
    #[error("report has an empty participant name")]
    EmptyParticipant,

    /// A report file name did not start with any known experiment prefix.
    #[error("unrecognised result file name: {0}")]
    UnknownFileName(String),
}
