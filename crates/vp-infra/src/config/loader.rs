//! # Configuration Loader / 配置加载器
//!
//! Reads a TOML file and maps it onto [`WizardConfig`]. Missing keys keep
//! their defaults; no value is validated here.
//! 读取 TOML 文件并映射为 [`WizardConfig`]，缺失的键保留默认值，此处不做校验。

use anyhow::Context;
use std::path::PathBuf;
use vp_core::config::WizardConfig;

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read, is not valid TOML, or a value
/// has the wrong type.
/// 文件无法读取、内容不是有效 TOML 或值类型错误时返回错误。
pub fn load_config(config_path: PathBuf) -> anyhow::Result<WizardConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    WizardConfig::from_toml(&toml_value)
}
