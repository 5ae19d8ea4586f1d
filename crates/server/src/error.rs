//! Structured errors for the quill-worker binary.
//!
//! Every variant renders with the same `CODE: detail` shape as engine errors,
//! so a host sees one error vocabulary on the reply stream.

/// Errors raised while decoding or answering an event line.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The input line is not a well-formed event envelope.
    #[error("INVALID_INPUT: {0}")]
    InvalidEnvelope(String),

    /// The engine failed while handling the event.
    #[error(transparent)]
    Engine(#[from] quill_core::Error),

    /// The handler task panicked or was cancelled.
    #[error("INTERNAL: {0}")]
    Task(String),

    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::InvalidEnvelope(err.to_string())
    }
}
