//! Error types for the storefront API client.
//!
//! # Design
//! Every failure a call can end in surfaces as one `ApiError` variant, so a
//! caller can match on it instead of inspecting strings. A response that
//! parsed as an envelope but was refused by the server (`Application`) is
//! kept apart from a response that never produced an envelope (`Transport`);
//! the first usually means "log in again", the second "check the network".

use thiserror::Error;

use crate::envelope::Envelope;

/// Raised when the client configuration cannot produce a valid URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No base URL was supplied.
    #[error("base URL is not set")]
    MissingBaseUrl,

    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The endpoint table has no entry for the requested key.
    #[error("unknown endpoint {domain}.{operation}")]
    UnknownEndpoint { domain: String, operation: String },

    /// An endpoint path in the table is malformed.
    #[error("invalid endpoint path {path:?} for {domain}.{operation}: {reason}")]
    InvalidEndpointPath {
        domain: String,
        operation: String,
        path: String,
        reason: &'static str,
    },

    /// Base URL and endpoint path joined into something that is not a URL.
    #[error("resolved URL {url:?} is malformed: {reason}")]
    MalformedUrl { url: String, reason: String },

    /// Query parameters could not be encoded.
    #[error("query encoding failed: {0}")]
    Query(String),

    /// An environment variable held an unusable value.
    #[error("invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}

/// Failures of the HTTP round-trip itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The caller-supplied timeout elapsed.
    #[error("request timeout")]
    Timeout,

    /// A non-2xx status whose body is not an envelope.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Anything else the transport reported.
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Failures reading or writing the persisted token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The store did not answer within the configured bound.
    #[error("token storage timed out")]
    Timeout,

    #[error("token storage I/O failed: {0}")]
    Io(String),

    /// The backing file exists but does not hold a JSON object.
    #[error("token storage is corrupt: {0}")]
    Corrupt(String),
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Parse,
    Application,
    Storage,
    Serialization,
}

/// Errors returned by every client call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The body is not JSON, or is JSON without a boolean `success` field.
    #[error("unparseable response (HTTP {status}): {message}")]
    Parse { status: u16, message: String },

    /// The server answered with an envelope that reports failure, or with an
    /// envelope attached to a non-2xx status.
    #[error("request rejected (HTTP {status}): {}", .envelope.message)]
    Application { status: u16, envelope: Envelope },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Configuration(_) => ErrorKind::Configuration,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Parse { .. } => ErrorKind::Parse,
            ApiError::Application { .. } => ErrorKind::Application,
            ApiError::Storage(_) => ErrorKind::Storage,
            ApiError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// HTTP status of the response this error came from, if one arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport(TransportError::Status { status, .. }) => Some(*status),
            ApiError::Parse { status, .. } | ApiError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server refused the credentials (401 or 403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// A failure envelope describing this error.
    ///
    /// Server-provided envelopes are returned as-is; every other kind gets a
    /// synthesized `success: false` envelope carrying the error's message.
    pub fn envelope(&self) -> Envelope {
        match self {
            ApiError::Application { envelope, .. } => envelope.clone(),
            other => Envelope::failure(other.to_string()),
        }
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        if self.is_auth_failure() {
            return "You are not logged in or your session has expired. Please log in again."
                .to_string();
        }
        match self {
            ApiError::Transport(_) => {
                "Network problem: could not reach the store. Check your connection and try again."
                    .to_string()
            }
            ApiError::Application { envelope, .. } if !envelope.message.is_empty() => {
                envelope.message.clone()
            }
            ApiError::Application { .. } => "The request was rejected by the store.".to_string(),
            ApiError::Parse { .. } => {
                "The store sent a response the app could not understand.".to_string()
            }
            ApiError::Storage(_) => {
                "Could not read the saved login. Please log in again.".to_string()
            }
            ApiError::Configuration(_) | ApiError::Serialization(_) => {
                "The app is misconfigured. Please update or reinstall it.".to_string()
            }
        }
    }
}
