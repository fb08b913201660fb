//! Construction-time failures of the engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error raised while constructing or starting the watcher.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A watcher instance is already alive in this process.
    #[error("only one watcher instance may be created per process")]
    AlreadyRunning,

    /// The source directory could not be inspected.
    #[error("failed to inspect source directory '{}': {source}", .path.display())]
    SourceUnavailable {
        /// The configured source path.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },

    /// The source path exists but is not a directory.
    #[error("source path '{}' is not a directory", .path.display())]
    SourceNotADirectory {
        /// The configured source path.
        path: PathBuf,
    },

    /// The poll worker thread could not be spawned.
    #[error("failed to spawn the poll worker: {source}")]
    Spawn {
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
}
