use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::ApiError;
use crate::wizard::WizardStep;

/// Error surfaced inline by the wizard.
///
/// 向导内联展示的错误。No variant is fatal: the session always stays retryable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum WizardError {
    /// Local check failed; nothing reached the network.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No response was received.
    #[error("network error: {message}")]
    Network { message: String },
    /// The server answered and refused the request.
    #[error("{message}")]
    ServerRejection { message: String },
    /// Camera unavailable or lost.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ValidationError {
    #[error("phone number must be exactly {expected_digits} digits")]
    InvalidPhone { expected_digits: usize },
    #[error("verification code must be exactly {expected_digits} digits")]
    InvalidOtpCode { expected_digits: usize },
    #[error("request a verification code first")]
    NoActiveChallenge,
    #[error("please wait {remaining_secs}s before requesting another code")]
    ResendCooldown { remaining_secs: u32 },
    #[error("phone number is already verified")]
    AlreadyVerified,
    #[error("a request is already in progress")]
    RequestInFlight,
    #[error("phone number cannot be changed after verification")]
    PhoneLocked,
    #[error(transparent)]
    StepLocked(#[from] StepGateError),
    #[error("capture or select a photo first")]
    MissingPhoto,
    #[error("upload your photo before submitting")]
    MissingVisitorIdentity,
    #[error("unknown visit purpose: {0}")]
    InvalidPurpose(String),
    #[error("visit duration must be a whole number of hours between 1 and 24, got {0:?}")]
    InvalidDuration(String),
    #[error("selected file is not a usable image: {0}")]
    InvalidImage(String),
    #[error("registration form is incomplete: {field} is missing")]
    IncompleteForm { field: String },
    #[error("review your details before submitting")]
    NotOnReview,
}

/// Entry precondition that failed for a forward move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum StepGateError {
    #[error("verify your phone number to continue")]
    PhoneNotVerified,
    #[error("accept the terms and conditions to continue")]
    TermsNotAccepted,
    #[error("take and upload your photo to continue")]
    PhotoNotUploaded,
    #[error("select the purpose of your visit")]
    PurposeNotSelected,
    #[error("enter your full name, company and government id")]
    DetailsIncomplete,
    #[error("enter the person to meet, department and visit duration")]
    MeetingIncomplete,
}

impl StepGateError {
    /// Step whose entry precondition this error reports.
    pub fn step(&self) -> WizardStep {
        match self {
            Self::PhoneNotVerified | Self::TermsNotAccepted => WizardStep::Photo,
            Self::PhotoNotUploaded => WizardStep::Purpose,
            Self::PurposeNotSelected => WizardStep::Details,
            Self::DetailsIncomplete => WizardStep::Meeting,
            Self::MeetingIncomplete => WizardStep::Review,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ResourceError {
    #[error("camera unavailable: {reason}")]
    CameraUnavailable { reason: String },
    #[error("photo capture failed: {reason}")]
    CaptureFailed { reason: String },
}

impl From<ApiError> for WizardError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(message) => Self::Network { message },
            ApiError::Rejected { message, .. } => Self::ServerRejection { message },
            ApiError::Unauthorized => Self::ServerRejection {
                message: "session expired, please sign in again".to_string(),
            },
            ApiError::Decode(message) => Self::ServerRejection {
                message: format!("unexpected server response: {message}"),
            },
        }
    }
}

impl From<StepGateError> for WizardError {
    fn from(err: StepGateError) -> Self {
        Self::Validation(ValidationError::StepLocked(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_are_classified() {
        assert!(matches!(
            WizardError::from(ApiError::Network("timeout".into())),
            WizardError::Network { .. }
        ));
        assert_eq!(
            WizardError::from(ApiError::Rejected {
                status: Some(400),
                message: "Invalid OTP".into()
            }),
            WizardError::ServerRejection {
                message: "Invalid OTP".into()
            }
        );
        assert!(matches!(
            WizardError::from(ApiError::Unauthorized),
            WizardError::ServerRejection { .. }
        ));
    }

    #[test]
    fn gate_errors_render_step_specific_messages() {
        let err = WizardError::from(StepGateError::PurposeNotSelected);
        assert_eq!(err.to_string(), "select the purpose of your visit");
        assert_eq!(StepGateError::PurposeNotSelected.step(), WizardStep::Details);
    }
}
