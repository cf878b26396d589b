//! Error types shared across the client.

use thiserror::Error;

/// Failures of a single instance selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    /// The context carried a sequence value that is not a signed 64-bit integer.
    #[error("illegal seq {0:?}")]
    InvalidContext(String),

    #[error("candidate set is empty")]
    EmptyCandidateSet,
}

/// Errors returned by [`crate::RpcClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid client config: {0}")]
    InvalidConfig(String),

    #[error("select instance for {service}: {source}")]
    Select {
        service: String,
        #[source]
        source: SelectError,
    },

    #[error("registry lookup for {service} failed: {message}")]
    Registry { service: String, message: String },

    #[error("encode {codec} payload: {message}")]
    Encode { codec: &'static str, message: String },

    #[error("decode {codec} payload: {message}")]
    Decode { codec: &'static str, message: String },

    #[error("build request: {0}")]
    Request(#[from] http::Error),

    #[error("transport: {0}")]
    Transport(#[from] hyper::Error),

    #[error("call to {address} timed out after {timeout_ms}ms")]
    Timeout { address: String, timeout_ms: u64 },

    #[error("remote error (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("client is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ClientError>;
