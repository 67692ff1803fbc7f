use serde::Serialize;

use crate::ids::TransactionId;

/// An outstanding one-time-code request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpChallenge {
    pub transaction_id: TransactionId,
    /// Milliseconds since the Unix epoch
    pub sent_at_ms: i64,
    pub cooldown_remaining: u32,
}

/// OTP flow state.
///
/// `Idle -> Sending -> Sent -> Verifying -> Verified`; `Sent -> Sending` only
/// once the resend cooldown has reached zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum OtpState {
    Idle,
    Sending,
    Sent { challenge: OtpChallenge },
    Verifying { challenge: OtpChallenge },
    Verified,
}

impl OtpState {
    pub fn challenge(&self) -> Option<&OtpChallenge> {
        match self {
            Self::Sent { challenge } | Self::Verifying { challenge } => Some(challenge),
            _ => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Sending | Self::Verifying { .. })
    }
}
