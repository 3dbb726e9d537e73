/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while parsing identifiers or loading catalogs.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An element id did not match any known element.
    #[error("unknown element: \"{0}\"")]
    UnknownElement(String),

    /// A stat id did not match HP, MP, ATK or DEF.
    #[error("unknown stat: \"{0}\"")]
    UnknownStat(String),

    /// A command id string could not be parsed.
    #[error("unknown command: \"{0}\"")]
    UnknownCommand(String),

    /// A gear slot id did not match any slot.
    #[error("unknown gear slot: \"{0}\"")]
    UnknownSlot(String),

    /// A catalog document failed to parse.
    #[error("catalog {name}: {source}")]
    Catalog {
        /// Catalog file name, e.g. `items.json`.
        name: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A catalog override file could not be read.
    #[error("reading {path}: {source}")]
    Io {
        /// Path of the file that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
