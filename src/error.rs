//! Error types for ARINC 429 encoding and bus handling

use thiserror::Error;

/// Result type for ARINC 429 operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while building, encoding or receiving ARINC 429 words
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Scale factor is zero or not a finite number
    #[error("Invalid scale: {0}")]
    InvalidScale(String),

    /// Scaled value does not fit in the 19-bit data field
    #[error("Encoding range error: {0}")]
    EncodingRange(String),

    /// A word field exceeds its bit width
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Received word failed the odd parity check
    #[error("Parity error: {0}")]
    ParityError(String),

    /// Parameter key or label is not part of the published set
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Not enough words or keys to complete the operation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

impl CodecError {
    /// Create a new InvalidScale error
    pub fn invalid_scale(msg: impl Into<String>) -> Self {
        CodecError::InvalidScale(msg.into())
    }

    /// Create a new EncodingRange error
    pub fn encoding_range(msg: impl Into<String>) -> Self {
        CodecError::EncodingRange(msg.into())
    }

    /// Create a new InvalidField error
    pub fn invalid_field(msg: impl Into<String>) -> Self {
        CodecError::InvalidField(msg.into())
    }

    /// Create a new ParityError
    pub fn parity_error(msg: impl Into<String>) -> Self {
        CodecError::ParityError(msg.into())
    }

    /// Create a new UnknownParameter error
    pub fn unknown_parameter(msg: impl Into<String>) -> Self {
        CodecError::UnknownParameter(msg.into())
    }

    /// Create a new InsufficientData error
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        CodecError::InsufficientData(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodecError::invalid_scale("scale must be non-zero");
        assert!(err.to_string().contains("Invalid scale"));

        let err = CodecError::encoding_range("600000 exceeds 19 bits");
        assert_eq!(
            err.to_string(),
            "Encoding range error: 600000 exceeds 19 bits"
        );
    }

    #[test]
    fn test_errors_compare_by_message() {
        assert_eq!(
            CodecError::parity_error("label 203"),
            CodecError::ParityError("label 203".to_string())
        );
        assert_ne!(
            CodecError::parity_error("label 203"),
            CodecError::invalid_field("label 203")
        );
    }
}
