//! REST transport errors
//!
//! Only transport and decoding failures are errors. HTTP error statuses other
//! than 429 are returned to the caller as ordinary response bodies.

use thiserror::Error;

/// Errors raised by [`Requester::request`](crate::Requester::request)
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection refused, TLS failure, timeout, or a broken body stream
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not valid JSON
    #[error("Failed to decode response body (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A header value contained characters that cannot be sent
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// A multipart part could not be built
    #[error("Invalid multipart form: {0}")]
    Form(String),

    /// Image bytes could not be turned into a data URI
    #[error(transparent)]
    Image(#[from] chat_core::DataUriError),
}

impl HttpError {
    /// True for connection-level failures (as opposed to bad data)
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result type alias for REST operations
pub type HttpResult<T> = Result<T, HttpError>;
