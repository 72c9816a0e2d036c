//! Error types returned by the plotting entry points.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience type alias for results that may contain a PlotError
pub type PlotResult<T> = Result<T, PlotError>;

/// Errors that can occur while building a figure.
#[derive(Error, Debug)]
pub enum PlotError {
    /// The plot kind identifier is not one of the supported kinds.
    #[error("Function not yet implemented: unknown plot kind '{0}'")]
    UnknownKind(String),

    /// A z selector was given for a kind that has no 3D rendering.
    #[error("Function not yet implemented: kind '{0}' does not accept a z selector")]
    NotImplemented(String),

    /// The call violates the request contract.
    ///
    /// Raised when data is absent and x or y is missing, when multi-level
    /// column labels are used without subplots, or when subplots are
    /// requested without data.
    #[error("{0}")]
    TypeContract(String),

    /// A selector names a column that the table does not have.
    #[error("Column '{0}' not found in data")]
    ColumnNotFound(String),

    /// A recognised styling option carries a value that cannot be used.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A keyword was forwarded to a plot primitive that does not accept it.
    #[error("{kind}() got an unexpected keyword argument '{key}'")]
    UnexpectedKeyword { kind: String, key: String },

    /// The table cannot be used for the requested operation.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A local logo file could not be read.
    #[error("Failed to read logo '{}'", path.display())]
    LogoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlotError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        PlotError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
