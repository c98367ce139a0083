//! Error types for pathway-import

use thiserror::Error;

/// Import error type
///
/// `Remote` and `Transport` describe one failed batch; the submitter counts
/// them and moves on. The other variants end the import run.
#[derive(Debug, Error)]
pub enum ImportError {
    /// CSV text could not be read as an import file
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Every row failed validation
    #[error("No valid questions found in CSV")]
    NoValidQuestions,

    /// Server answered with an error status
    #[error("Server returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// Server address is not an absolute http(s) URL
    #[error("Invalid server URL: {0}")]
    InvalidServerUrl(String),

    /// Request never got a usable answer (connection, timeout, bad body)
    #[error("Request failed: {0}")]
    Transport(String),

    /// Not a single batch was accepted
    #[error("Import failed: none of {attempted} assessment(s) could be updated")]
    TotalFailure { attempted: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Caller does not own the assessment
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ImportError::Remote { status: 403, .. })
    }

    /// Slug unknown to the server
    pub fn is_not_found(&self) -> bool {
        matches!(self, ImportError::Remote { status: 404, .. })
    }
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
