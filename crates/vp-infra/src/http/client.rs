use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use vp_core::config::ApiConfig;
use vp_core::ports::{AccessTokenPort, ApiError, SessionExpiredPort};

use super::dto::ErrorBody;

/// Shared HTTP plumbing: base URL, bearer token, status classification.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn AccessTokenPort>,
    session_expired: Arc<dyn SessionExpiredPort>,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        tokens: Arc<dyn AccessTokenPort>,
        session_expired: Arc<dyn SessionExpiredPort>,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("API base URL cannot carry a path: {}", config.base_url);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            tokens,
            session_expired,
        })
    }

    /// Joins path segments onto the base URL, escaping each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.http.get(url)
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.http.post(url)
    }

    /// Sends `request` with the bearer token and decodes a 2xx JSON body.
    ///
    /// A 401 notifies the session-expired collaborator before failing.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let request = match self.tokens.access_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "api response");

        if status == StatusCode::UNAUTHORIZED {
            warn!(endpoint, "api session expired");
            self.session_expired.on_session_expired().await;
            return Err(ApiError::Unauthorized);
        }

        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            warn!(endpoint, status = status.as_u16(), message = %message, "api request rejected");
            return Err(ApiError::Rejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|err| {
            warn!(endpoint, error = %err, "api response did not match contract");
            ApiError::Decode(err.to_string())
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Network("request timed out".to_string())
    } else if error.is_decode() {
        ApiError::Decode(error.to_string())
    } else {
        ApiError::Network(error.to_string())
    }
}
