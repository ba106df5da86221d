//! Error types for the status-page client.
//!
//! # Design
//! Each failure stage of a call has its own variant so callers can tell a
//! misconfigured client from an unreachable server, a rejected request, or a
//! response that does not match the expected shape. `Api` carries the remote
//! status code and the message from the JSON error envelope.

use thiserror::Error;

/// Errors returned by client and service operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The base URL is missing or invalid, or a request URL could not be
    /// assembled. Also raised when no page id is available for a call.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request payload could not be serialized. Nothing was sent.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The server could not be reached (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server answered with a non-2xx status.
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body did not decode into the expected type.
    #[error("failed to decode response (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// The HTTP status attached to this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404) && matches!(self, Error::Api { .. })
    }
}

/// Raised when a status string is not part of its closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status `{0}`")]
pub struct UnknownStatus(pub String);

pub type Result<T> = std::result::Result<T, Error>;
