//! Error types for the bid-tabulation engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the bid-tabulation engine.
///
/// A missing or malformed field inside a bid file is never an error: the
/// parser substitutes the field's default and reports it separately.
#[derive(Error, Debug)]
pub enum Error {
    /// The input bytes could not be decoded as text.
    #[error("Input error: {filename} is not valid UTF-8 text")]
    InputEncoding { filename: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (inconsistent or invalid data).
    #[error("Data error: {0}")]
    Data(String),

    /// Extraction pattern failed to compile.
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an input encoding error.
    pub fn input_encoding(filename: impl Into<String>) -> Self {
        Error::InputEncoding {
            filename: filename.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Whether this error is a per-file input failure.
    pub fn is_input_failure(&self) -> bool {
        matches!(self, Error::InputEncoding { .. } | Error::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_encoding_message() {
        let err = Error::input_encoding("A.TXT");
        assert_eq!(err.to_string(), "Input error: A.TXT is not valid UTF-8 text");
        assert!(err.is_input_failure());
    }

    #[test]
    fn test_data_error_is_not_input_failure() {
        assert!(!Error::data("mismatch").is_input_failure());
    }
}
