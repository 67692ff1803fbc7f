//! Local input checks that run before any network call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::wizard::ValidationError;

pub const PHONE_DIGITS: usize = 10;
pub const OTP_CODE_DIGITS: usize = 4;

/// A phone number that passed the local digit check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if is_exact_digits(trimmed, PHONE_DIGITS) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ValidationError::InvalidPhone {
                expected_digits: PHONE_DIGITS,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A one-time code. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if is_exact_digits(trimmed, OTP_CODE_DIGITS) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ValidationError::InvalidOtpCode {
                expected_digits: OTP_CODE_DIGITS,
            })
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(****)")
    }
}

fn is_exact_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_requires_exactly_ten_digits() {
        assert!(PhoneNumber::parse("9999999999").is_ok());
        assert!(PhoneNumber::parse(" 9999999999 ").is_ok());
        assert!(PhoneNumber::parse("999999999").is_err());
        assert!(PhoneNumber::parse("99999999999").is_err());
        assert!(PhoneNumber::parse("99999-9999").is_err());
        assert!(PhoneNumber::parse("").is_err());
    }

    #[test]
    fn otp_code_requires_exactly_four_digits() {
        assert!(OtpCode::parse("1234").is_ok());
        assert_eq!(
            OtpCode::parse("12a4"),
            Err(ValidationError::InvalidOtpCode { expected_digits: 4 })
        );
        assert!(OtpCode::parse("12345").is_err());
    }

    #[test]
    fn otp_code_debug_is_redacted() {
        let code = OtpCode::parse("1234").unwrap();
        assert!(!format!("{code:?}").contains("1234"));
    }
}
