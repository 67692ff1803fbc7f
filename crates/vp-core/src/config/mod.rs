//! Wizard configuration domain model
//!
//! Pure data: mapping from TOML with defaults for missing keys, no validation.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Registration wizard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WizardConfig {
    pub api: ApiConfig,
    pub otp: OtpConfig,
    pub camera: CameraConfig,
}

/// Backend endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    /// Seconds before a resend is accepted
    pub resend_cooldown_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Visible countdown before a frame is grabbed
    pub countdown_secs: u32,
    pub jpeg_quality: u8,
    pub flash_by_default: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            resend_cooldown_secs: 30,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 3,
            jpeg_quality: 90,
            flash_by_default: true,
        }
    }
}

impl WizardConfig {
    /// Map a parsed TOML document onto the config, keeping defaults for missing keys.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        toml_value
            .clone()
            .try_into()
            .context("Failed to map TOML onto WizardConfig")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let value: toml::Value = toml::from_str(
            r#"
            [api]
            base_url = "https://visitors.example.com/api"
            "#,
        )
        .unwrap();

        let config = WizardConfig::from_toml(&value).unwrap();

        assert_eq!(config.api.base_url, "https://visitors.example.com/api");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.otp.resend_cooldown_secs, 30);
        assert_eq!(config.camera.countdown_secs, 3);
        assert!(config.camera.flash_by_default);
    }

    #[test]
    fn wrong_value_type_is_an_error() {
        let value: toml::Value = toml::from_str(
            r#"
            [otp]
            resend_cooldown_secs = "thirty"
            "#,
        )
        .unwrap();

        assert!(WizardConfig::from_toml(&value).is_err());
    }
}
