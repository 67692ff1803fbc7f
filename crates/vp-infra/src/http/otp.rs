use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use vp_core::ports::{ApiError, OtpApiPort};
use vp_core::registration::{OtpCode, PhoneNumber};
use vp_core::TransactionId;

use super::dto::{SendOtpRequest, SendOtpResponse, VerifyOtpResponse};
use super::ApiClient;

/// `POST /auth/sendOtp` and `GET /auth/verifyOtp`.
pub struct HttpOtpApi {
    client: Arc<ApiClient>,
}

impl HttpOtpApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OtpApiPort for HttpOtpApi {
    async fn send_otp(&self, phone: &PhoneNumber) -> Result<TransactionId, ApiError> {
        let url = self.client.endpoint(&["auth", "sendOtp"]);
        let request = self.client.post(url).json(&SendOtpRequest {
            phone_no: phone.as_str(),
        });
        let response: SendOtpResponse = self.client.send_json("auth.send_otp", request).await?;

        if response.success == Some(false) {
            return Err(ApiError::Rejected {
                status: None,
                message: response
                    .message
                    .unwrap_or_else(|| "failed to send verification code".to_string()),
            });
        }
        let txn_id = response
            .txn_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::Decode("response has no txnId".to_string()))?;
        debug!(transaction_id = %txn_id, "otp send accepted");
        Ok(TransactionId::from(txn_id))
    }

    async fn verify_otp(
        &self,
        transaction_id: &TransactionId,
        code: &OtpCode,
    ) -> Result<bool, ApiError> {
        let url = self.client.endpoint(&["auth", "verifyOtp"]);
        let request = self
            .client
            .get(url)
            .query(&[("txnId", transaction_id.as_str()), ("otp", code.expose())]);
        let response: VerifyOtpResponse =
            self.client.send_json("auth.verify_otp", request).await?;
        Ok(response.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::tests::{client_for, CountingExpiry};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn send_otp_posts_phone_with_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/auth/sendOtp")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::Json(json!({ "phoneNo": "9999999999" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"txnId":"T1"}"#)
            .create_async()
            .await;

        let api = HttpOtpApi::new(client_for(&server.url(), Arc::default()));
        let phone = PhoneNumber::parse("9999999999").unwrap();
        let txn = api.send_otp(&phone).await.unwrap();

        mock.assert_async().await;
        assert_eq!(txn, TransactionId::from("T1"));
    }

    #[tokio::test]
    async fn send_otp_without_txn_id_is_a_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/auth/sendOtp")
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        let api = HttpOtpApi::new(client_for(&server.url(), Arc::default()));
        let phone = PhoneNumber::parse("9999999999").unwrap();
        let err = api.send_otp(&phone).await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn verify_otp_sends_query_and_reports_success_flag() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/auth/verifyOtp")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("txnId".into(), "T1".into()),
                Matcher::UrlEncoded("otp".into(), "1234".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"success":false}"#)
            .create_async()
            .await;

        let api = HttpOtpApi::new(client_for(&server.url(), Arc::default()));
        let verified = api
            .verify_otp(&TransactionId::from("T1"), &OtpCode::parse("1234").unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(!verified);
    }

    #[tokio::test]
    async fn unauthorized_notifies_session_expiry() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/auth/sendOtp")
            .with_status(401)
            .create_async()
            .await;

        let expiry = Arc::new(CountingExpiry::default());
        let api = HttpOtpApi::new(client_for(&server.url(), expiry.clone()));
        let phone = PhoneNumber::parse("9999999999").unwrap();
        let err = api.send_otp(&phone).await.unwrap_err();

        assert_eq!(err, ApiError::Unauthorized);
        assert_eq!(expiry.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_error_carries_status_and_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/auth/sendOtp")
            .with_status(503)
            .with_body(r#"{"message":"SMS gateway down"}"#)
            .create_async()
            .await;

        let api = HttpOtpApi::new(client_for(&server.url(), Arc::default()));
        let phone = PhoneNumber::parse("9999999999").unwrap();
        let err = api.send_otp(&phone).await.unwrap_err();

        assert_eq!(
            err,
            ApiError::Rejected {
                status: Some(503),
                message: "SMS gateway down".to_string()
            }
        );
    }
}
