//! Error types for the cleaning step

use std::path::PathBuf;

/// Errors raised while resolving, cleaning or publishing a dataset.
///
/// Unparseable dates are not an error: they are nulled in place and counted
/// in [`crate::cleaning::CleanStats`].
#[derive(Debug, thiserror::Error)]
pub enum CleaningError {
    #[error("Artifact not found: {reference}")]
    ArtifactNotFound { reference: String },

    #[error("Invalid artifact reference '{reference}': {message}")]
    InvalidReference { reference: String, message: String },

    #[error("Malformed input {path:?}: {message}")]
    MalformedInput { path: PathBuf, message: String },

    #[error("Missing required column '{column}' in {path:?}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid price bounds: min_price={min}, max_price={max}")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Artifact store error: {message}")]
    Store { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CleaningError {
    /// True for failures caused by the caller's input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CleaningError::ArtifactNotFound { .. }
                | CleaningError::InvalidReference { .. }
                | CleaningError::MalformedInput { .. }
                | CleaningError::MissingColumn { .. }
                | CleaningError::InvalidBounds { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CleaningError>;
