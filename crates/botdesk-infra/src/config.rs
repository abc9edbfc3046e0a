//! Configuration loading for BotDesk.
//!
//! Reads `config.toml` from the data directory (`~/.botdesk/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed. The upstream gateway API key never lives in
//! the file; it comes from the environment and is wrapped in a
//! [`SecretString`] immediately.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use botdesk_types::config::GlobalConfig;
use botdesk_types::error::ConfigError;

/// Environment variable holding the upstream gateway API key.
pub const GATEWAY_KEY_ENV: &str = "BOTDESK_GATEWAY_KEY";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `BOTDESK_DATA_DIR` environment variable
/// 2. `~/.botdesk`
/// 3. `.botdesk` under the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BOTDESK_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".botdesk");
    }

    PathBuf::from(".botdesk")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Read the upstream gateway API key from the environment.
///
/// The relay cannot serve a single completion without it, so a missing or
/// empty value is a startup-fatal [`ConfigError::MissingCredential`].
pub fn gateway_api_key() -> Result<SecretString, ConfigError> {
    match std::env::var(GATEWAY_KEY_ENV) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        _ => Err(ConfigError::MissingCredential(GATEWAY_KEY_ENV.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botdesk_types::billing::Plan;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.gateway.base_url, "https://ai.gateway.lovable.dev/v1");
        assert!(!config.widget.record_widget_transcripts);
    }

    #[tokio::test]
    async fn test_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[gateway]
model = "google/gemini-3-pro"

[billing]
fallback_plan = "starter"

[[billing.plan_prices]]
price_id = "pri_custom"
plan = "growth"
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.gateway.model, "google/gemini-3-pro");
        assert_eq!(config.billing.fallback_plan, Plan::Starter);
        assert_eq!(config.billing.plan_for_price("pri_custom"), Plan::Growth);
    }

    #[tokio::test]
    async fn test_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.gateway.model, "google/gemini-3-flash-preview");
    }
}
