//! HTTP side of the panel: wire types and a small client for the three
//! backend endpoints.

pub mod error;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use error::{ApiError, ApiResult};

/// Backend the panel talks to when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "https://nakahara_basket_site_be.onrender.com";

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

impl HealthStatus {
    /// Shown when the health endpoint can't be reached or answers garbage
    pub fn unreachable() -> Self {
        Self {
            status: "error".to_string(),
            message: "cannot reach backend".to_string(),
        }
    }
}

/// One entry of `GET /users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Only used as a display key, so whatever JSON the backend sends is kept as-is
    #[serde(default)]
    pub id: serde_json::Value,
    pub name: String,
    pub email: String,
}

/// Body of `POST /echo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EchoResult {
    Reply {
        received_message: String,
        response: String,
        timestamp: String,
    },
    Failed {
        error: String,
    },
}

impl EchoResult {
    pub fn send_failed() -> Self {
        EchoResult::Failed {
            error: "failed to send message".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EchoRequest<'a> {
    message: &'a str,
}

/// Thin wrapper over a reqwest client bound to one backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join an endpoint path onto the base url
    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", self.base_url, e)))
    }

    pub async fn health(&self) -> ApiResult<HealthStatus> {
        let url = self.endpoint("health")?;
        tracing::debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    pub async fn users(&self) -> ApiResult<Vec<UserRecord>> {
        let url = self.endpoint("users")?;
        tracing::debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    pub async fn echo(&self, message: &str) -> ApiResult<EchoResult> {
        let url = self.endpoint("echo")?;
        tracing::debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .json(&EchoRequest { message })
            .send()
            .await?;
        decode(response).await
    }
}

/// Decode the body regardless of status code; a non-2xx answer only fails if
/// its body isn't the expected shape.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        tracing::debug!("backend answered {}", status);
    }
    Ok(serde_json::from_slice(&body)?)
}
