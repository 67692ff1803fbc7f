//! Token source and session-expiry hook for hosts without a login flow.

use async_trait::async_trait;
use tracing::warn;

use vp_core::ports::{AccessTokenPort, SessionExpiredPort};

/// Fixed bearer token, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticAccessToken(Option<String>);

impl StaticAccessToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|token| !token.trim().is_empty()))
    }
}

#[async_trait]
impl AccessTokenPort for StaticAccessToken {
    async fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Logs the 401 so the operator knows to sign in again.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSessionExpired;

#[async_trait]
impl SessionExpiredPort for LoggingSessionExpired {
    async fn on_session_expired(&self) {
        warn!("backend rejected the access token; sign in again");
    }
}
