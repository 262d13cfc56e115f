//! Error type shared by every stage of the codec.

use thiserror::Error;

/// Errors that can occur while compressing or decompressing an image.
///
/// Every variant is fatal for the current call: the codec never retries and
/// never returns a partially reconstructed image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input grid or patch has the wrong dimensionality or size.
    #[error("Invalid shape: {reason} (got {height}x{width})")]
    Shape {
        reason: String,
        height: usize,
        width: usize,
    },

    /// A value violates a precondition of the operation.
    #[error("Value out of domain: {0}")]
    Domain(String),

    /// A vector does not have the expected number of elements.
    #[error("Invalid length: expected {expected} elements, got {actual}")]
    Length { expected: usize, actual: usize },

    /// The bitstream decodes past a block's capacity, ends early, or holds a
    /// different number of blocks than its header declares.
    #[error("Bitstream decode out of bounds: {0}")]
    DecodeBounds(String),
}

impl CodecError {
    pub(crate) fn shape(reason: impl Into<String>, height: usize, width: usize) -> Self {
        CodecError::Shape {
            reason: reason.into(),
            height,
            width,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = CodecError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_display() {
        let err = CodecError::shape("dimensions must be multiples of 8", 10, 16);
        assert_eq!(
            err.to_string(),
            "Invalid shape: dimensions must be multiples of 8 (got 10x16)"
        );
    }

    #[test]
    fn test_length_error_display() {
        let err = CodecError::Length {
            expected: 64,
            actual: 63,
        };
        assert_eq!(err.to_string(), "Invalid length: expected 64 elements, got 63");
    }

    #[test]
    fn test_domain_and_bounds_display() {
        let err = CodecError::Domain("integer must be non-negative: -3".to_string());
        assert_eq!(err.to_string(), "Value out of domain: integer must be non-negative: -3");

        let err = CodecError::DecodeBounds("coefficient index 64".to_string());
        assert_eq!(err.to_string(), "Bitstream decode out of bounds: coefficient index 64");
    }
}
