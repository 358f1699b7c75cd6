//! Unified error type for model operations
//!
//! [`GridError`] covers failures raised by the model container itself, such
//! as inserting a line whose endpoint bus does not exist. Readers wrap these
//! in their own error types at the API boundary.

use thiserror::Error;

/// Errors raised while building or querying a [`crate::DistributionModel`].
#[derive(Error, Debug)]
pub enum GridError {
    /// An element refers to another element that is not in the model
    #[error("Reference error: {0}")]
    Reference(String),

    /// An element name is already taken by an element of a different kind
    #[error("Name conflict: {0}")]
    Conflict(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Convenience type alias for Results using GridError.
pub type GridResult<T> = Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridError::Reference("line L1 references unknown bus J9".into());
        assert!(err.to_string().contains("Reference error"));
        assert!(err.to_string().contains("J9"));
    }

    #[test]
    fn test_conflict_display() {
        let err = GridError::Conflict("'J1' is a bus in the model but a line in the input".into());
        assert!(err.to_string().starts_with("Name conflict: "));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> GridResult<()> {
            Err(GridError::Validation("test".into()))
        }

        fn outer() -> GridResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
