use thiserror::Error;

/// Anything that stops a flow from producing its expected payload.
///
/// The panel treats every variant the same way (log, then show the fallback),
/// but keeping them apart makes the log line useful.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
