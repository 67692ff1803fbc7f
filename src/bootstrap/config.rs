//! # Config resolution / 配置解析
//!
//! Decides which file to read and falls back to defaults when none exists.
//! Parsing lives in `vp_infra::config`.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use vp_core::config::WizardConfig;

pub const CONFIG_ENV_VAR: &str = "VISITORPASS_CONFIG";

/// `VISITORPASS_CONFIG` wins, then `<config_dir>/visitorpass/config.toml`.
/// 优先使用 `VISITORPASS_CONFIG`，其次为系统配置目录下的 `visitorpass/config.toml`。
pub fn resolve_config_path() -> Option<PathBuf> {
    resolve_from(
        std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
        dirs::config_dir(),
    )
}

fn resolve_from(explicit: Option<PathBuf>, config_dir: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| config_dir.map(|dir| dir.join("visitorpass").join("config.toml")))
}

/// Loads the resolved file, or the defaults when there is no file.
///
/// A file that exists but cannot be parsed is an error.
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<WizardConfig> {
    match path {
        Some(path) if path.exists() => {
            info!(path = %path.display(), "loading config");
            vp_infra::load_config(path.to_path_buf())
        }
        Some(path) => {
            debug!(path = %path.display(), "config file not found, using defaults");
            Ok(WizardConfig::default())
        }
        None => Ok(WizardConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn explicit_path_wins_over_config_dir() {
        let resolved = resolve_from(
            Some(PathBuf::from("/etc/vp.toml")),
            Some(PathBuf::from("/home/me/.config")),
        );
        assert_eq!(resolved, Some(PathBuf::from("/etc/vp.toml")));
    }

    #[test]
    fn falls_back_to_config_dir() {
        let resolved = resolve_from(None, Some(PathBuf::from("/home/me/.config")));
        assert_eq!(
            resolved,
            Some(PathBuf::from("/home/me/.config/visitorpass/config.toml"))
        );
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = load_or_default(Some(Path::new("/nonexistent/visitorpass.toml"))).unwrap();
        assert_eq!(config, WizardConfig::default());
    }

    #[test]
    fn existing_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[otp]\nresend_cooldown_secs = 60\n").unwrap();

        let config = load_or_default(Some(file.path())).unwrap();

        assert_eq!(config.otp.resend_cooldown_secs, 60);
    }

    #[test]
    fn broken_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[otp\n").unwrap();

        assert!(load_or_default(Some(file.path())).is_err());
    }
}
