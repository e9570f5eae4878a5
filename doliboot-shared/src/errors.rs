//! Error types shared across the bootstrap.
//!
//! Every variant is fatal: the bootstrap logs it and exits non-zero before
//! the server process is started. The only retried condition (database not
//! reachable yet) never surfaces as a `BootError`.

use thiserror::Error;

/// Result alias used throughout doliboot.
pub type BootResult<T> = Result<T, BootError>;

#[derive(Error, Debug)]
pub enum BootError {
    /// Missing or invalid environment variable / flag.
    #[error("configuration error: {0}")]
    Config(String),

    /// A numeric ID is already owned by a different account.
    #[error("{table}: id {id} is already in use by '{owner}'")]
    IdentityConflict {
        table: String,
        id: u32,
        owner: String,
    },

    /// Malformed identity table or failure reading/writing it.
    #[error("identity error: {0}")]
    Identity(String),

    /// Filesystem I/O (mkdir, copy, chown, chmod, remove).
    #[error("storage error: {0}")]
    Storage(String),

    /// Bundle archive could not be read or extracted.
    #[error("archive error: {0}")]
    Archive(String),

    /// Database connection or statement failure.
    #[error("database error: {0}")]
    Database(String),

    /// External SQL script execution failed.
    #[error("script error: {0}")]
    Script(String),

    /// The server process could not replace the bootstrap.
    #[error("handoff error: {0}")]
    Handoff(String),
}
