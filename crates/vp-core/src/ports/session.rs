use async_trait::async_trait;

/// Source of the bearer token attached to every backend call.
///
/// Storage of the token is the host's concern.
#[async_trait]
pub trait AccessTokenPort: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// Notified when the backend answers 401 (redirect-to-login collaborator).
#[async_trait]
pub trait SessionExpiredPort: Send + Sync {
    async fn on_session_expired(&self);
}
