use async_trait::async_trait;

use crate::ids::TransactionId;
use crate::ports::ApiError;
use crate::registration::{OtpCode, PhoneNumber};

/// `POST /auth/sendOtp` and `GET /auth/verifyOtp`.
#[async_trait]
pub trait OtpApiPort: Send + Sync {
    async fn send_otp(&self, phone: &PhoneNumber) -> Result<TransactionId, ApiError>;

    /// Returns the server's `success` flag; `false` means the code was wrong.
    async fn verify_otp(&self, transaction_id: &TransactionId, code: &OtpCode)
        -> Result<bool, ApiError>;
}
