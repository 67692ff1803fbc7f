use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use vp_core::ports::{ApiError, SelfieUpload, SelfieUploadPort, VisitorApiPort};
use vp_core::registration::RegistrationRequest;
use vp_core::{PassDetails, VisitorId};

use super::dto::{Envelope, SelfieData};
use super::ApiClient;

const SELFIE_FIELD: &str = "selfie";
const SELFIE_FILE_NAME: &str = "selfie.jpg";
const SELFIE_MIME: &str = "image/jpeg";

/// Selfie upload, visitor registration and pass generation.
pub struct HttpVisitorApi {
    client: Arc<ApiClient>,
}

impl HttpVisitorApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SelfieUploadPort for HttpVisitorApi {
    async fn upload_selfie(&self, jpeg: Bytes) -> Result<SelfieUpload, ApiError> {
        let size = jpeg.len();
        let part = Part::bytes(jpeg.to_vec())
            .file_name(SELFIE_FILE_NAME)
            .mime_str(SELFIE_MIME)
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        let form = Form::new().part(SELFIE_FIELD, part);

        let url = self.client.endpoint(&["visitor", "visitor-selfie"]);
        let request = self.client.post(url).multipart(form);
        let envelope: Envelope<SelfieData> =
            self.client.send_json("visitor.upload_selfie", request).await?;

        let data = envelope
            .into_data()?
            .ok_or_else(|| ApiError::Decode("selfie response has no data".to_string()))?;
        if data.visitor_id.trim().is_empty() {
            return Err(ApiError::Decode("selfie response has no visitorId".to_string()));
        }
        debug!(visitor_id = %data.visitor_id, bytes = size, "selfie stored");
        Ok(SelfieUpload {
            visitor_id: VisitorId::from(data.visitor_id),
            selfie_url: data.visitor_selfie_url,
        })
    }
}

#[async_trait]
impl VisitorApiPort for HttpVisitorApi {
    async fn submit_request(
        &self,
        visitor_id: &VisitorId,
        request: &RegistrationRequest,
    ) -> Result<(), ApiError> {
        let url = self
            .client
            .endpoint(&["visitor", "visitor-request", visitor_id.as_str()]);
        let builder = self.client.post(url).json(request);
        let envelope: Envelope<serde_json::Value> = self
            .client
            .send_json("visitor.submit_request", builder)
            .await?;
        envelope.into_data().map(|_| ())
    }

    async fn generate_pass(&self, visitor_id: &VisitorId) -> Result<PassDetails, ApiError> {
        let url = self
            .client
            .endpoint(&["visitor", "visitor-pass", visitor_id.as_str()]);
        let builder = self.client.get(url);
        let envelope: Envelope<PassDetails> = self
            .client
            .send_json("visitor.generate_pass", builder)
            .await?;
        Ok(envelope.into_data()?.unwrap_or_default())
    }
}
