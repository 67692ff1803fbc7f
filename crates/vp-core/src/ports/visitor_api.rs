use async_trait::async_trait;
use bytes::Bytes;

use crate::ids::VisitorId;
use crate::ports::ApiError;
use crate::registration::{PassDetails, RegistrationRequest};

/// Identity minted by the selfie upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfieUpload {
    pub visitor_id: VisitorId,
    pub selfie_url: String,
}

/// `POST /visitor/visitor-selfie` (multipart field `selfie`).
#[async_trait]
pub trait SelfieUploadPort: Send + Sync {
    async fn upload_selfie(&self, jpeg: Bytes) -> Result<SelfieUpload, ApiError>;
}

/// Registration and pass generation, both keyed by the visitor identity.
#[async_trait]
pub trait VisitorApiPort: Send + Sync {
    /// `POST /visitor/visitor-request/{visitorId}`
    async fn submit_request(
        &self,
        visitor_id: &VisitorId,
        request: &RegistrationRequest,
    ) -> Result<(), ApiError>;

    /// `GET /visitor/visitor-pass/{visitorId}`
    async fn generate_pass(&self, visitor_id: &VisitorId) -> Result<PassDetails, ApiError>;
}
