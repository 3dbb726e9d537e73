//! Error types for a Mossvale session.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur outside gameplay: loading content, reading and
/// writing save slots, parsing typed commands.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A save slot number outside `1..=max_slots`.
    #[error("invalid save slot: {0}")]
    InvalidSlot(u32),

    /// A save file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        /// File or directory involved.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A save file did not hold a valid record.
    #[error("save data: {0}")]
    Json(#[from] serde_json::Error),

    /// A command the current mode does not offer.
    #[error("not available right now: {0}")]
    Unavailable(String),

    /// Unknown input key name.
    #[error("unknown key: {0}")]
    UnknownKey(String),

    /// Catalog or command parse error.
    #[error("{0}")]
    Core(#[from] mv_core::CoreError),

    /// Mechanics engine error.
    #[error("{0}")]
    Mechanics(#[from] mv_mechanics::MechError),
}
