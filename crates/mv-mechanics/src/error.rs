//! Error types for the mechanics engine.

/// Errors raised when the engine is handed something it cannot resolve.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MechError {
    /// A spell id that is not in the catalog.
    #[error("unknown spell: {0}")]
    UnknownSpell(String),

    /// A quest id that is not in the catalog.
    #[error("unknown quest: {0}")]
    UnknownQuest(String),
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
