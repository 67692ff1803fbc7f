use thiserror::Error;

/// Failure of a backend call, classified at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was received (connect error, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a failure status or `success: false`.
    #[error("request rejected: {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    /// 401: the bearer token is no longer valid.
    #[error("unauthorized")]
    Unauthorized,

    /// The response body did not match the contract.
    #[error("decode error: {0}")]
    Decode(String),
}
