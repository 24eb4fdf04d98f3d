use thiserror::Error;

/// Error types for the peakfit-rs library.
///
/// Only configuration problems are reported through this type. Constraint
/// violations stay inside the fitter, and caller bugs (bad indices, loading
/// into a populated sum of functions) are assertions.
#[derive(Error, Debug)]
pub enum FitError {
    /// The persisted `"type"` tag does not name a known function.
    #[error("Unknown function type: {0}")]
    UnknownFunctionType(String),

    /// A required key is missing from a persisted object.
    #[error("Missing key: {0}")]
    MissingKey(String),

    /// A key is present but its value has the wrong shape.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FitError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        FitError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for peakfit-rs operations.
pub type Result<T> = std::result::Result<T, FitError>;
