//! Error types for frontier data handling

use thiserror::Error;

/// Errors raised while encoding or decoding frontier payloads
#[derive(Debug, Error)]
pub enum Error {
    /// A response body could not be decoded for the given operation
    #[error("malformed {operation} response: {reason}")]
    MalformedResponse {
        operation: &'static str,
        reason: String,
    },

    /// A request body could not be serialized
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// A destination string was not of the form `frontier/slot`
    #[error("invalid destination '{0}': expected 'frontier/slot'")]
    InvalidDestination(String),
}

impl Error {
    pub(crate) fn malformed(operation: &'static str, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            operation,
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for frontier data handling
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::malformed("fetch", "line 2: expected value");
        assert_eq!(
            err.to_string(),
            "malformed fetch response: line 2: expected value"
        );

        let err = Error::InvalidDestination("nope".into());
        assert!(err.to_string().contains("frontier/slot"));
    }
}
