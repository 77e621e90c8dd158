//! Error types module
//!
//! Screening converts every expected failure into a reason on the report, so
//! the error surface of the pipeline itself is small: malformed caller input
//! that is rejected before any I/O, and cooperative cancellation.

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Screening cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Get the error type name for structured log fields
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::InvalidArgument(_) => "InvalidArgument",
            PipelineError::Cancelled => "Cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_message() {
        let err = PipelineError::InvalidArgument("file_name must not be empty".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid argument: file_name must not be empty"
        );
        assert_eq!(err.error_type(), "InvalidArgument");
    }

    #[test]
    fn test_cancelled_message() {
        let err = PipelineError::Cancelled;
        assert_eq!(err.to_string(), "Screening cancelled");
        assert_eq!(err.error_type(), "Cancelled");
    }
}
