//! Error types for roomsync wire handling.

use thiserror::Error;

/// Errors that can occur while decoding roomsync wire payloads.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON decoding failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// JSON encoding failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The server signalled failure
    #[error("request rejected (code {code}): {message}")]
    Rejected {
        /// Server-provided status code.
        code: i64,
        /// Server-provided message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display_carries_server_message() {
        let err = WireError::Rejected {
            code: 20404100,
            message: "invalid nextId".into(),
        };
        assert_eq!(
            err.to_string(),
            "request rejected (code 20404100): invalid nextId"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WireError>();
    }
}
