//! Wire shapes of the visitor backend.

use serde::{Deserialize, Serialize};

use vp_core::ports::ApiError;

/// `{ success, message, data }` wrapper used by the visitor endpoints.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// `success: false` is a rejection even on a 2xx status.
    pub fn into_data(self) -> Result<Option<T>, ApiError> {
        if self.success == Some(false) {
            return Err(ApiError::Rejected {
                status: None,
                message: self
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            });
        }
        Ok(self.data)
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest<'a> {
    pub phone_no: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub txn_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfieData {
    #[serde(default)]
    pub visitor_id: String,
    #[serde(default)]
    pub visitor_selfie_url: String,
}
