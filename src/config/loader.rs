//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters, and
//! providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
    let path = Path::new(path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig =
        toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;

    validate_config(&config)?;

    info!(
        name = %config.engine.name,
        orders_interval = config.polling.orders_interval_secs,
        store_status_interval = config.polling.store_status_interval_secs,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
    anyhow::ensure!(
        !config.engine.name.is_empty(),
        "engine.name must not be empty"
    );

    anyhow::ensure!(
        !config.api.base_url.is_empty(),
        "api.base_url must not be empty"
    );
    anyhow::ensure!(
        config.api.base_url.starts_with("http://")
            || config.api.base_url.starts_with("https://"),
        "api.base_url must be an http(s) URL, got {}",
        config.api.base_url
    );
    anyhow::ensure!(
        config.api.timeout_ms > 0,
        "api.timeout_ms must be positive"
    );

    anyhow::ensure!(
        config.polling.orders_interval_secs > 0,
        "polling.orders_interval_secs must be positive"
    );
    anyhow::ensure!(
        config.polling.store_status_interval_secs > 0,
        "polling.store_status_interval_secs must be positive"
    );

    anyhow::ensure!(
        config.view.default_page_size >= 1,
        "view.default_page_size must be at least 1, got {}",
        config.view.default_page_size
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [engine]
            name = "orders-screen"

            [api]
            base_url = "https://merchant-api.example.com"
            "#,
        )
        .unwrap();

        assert!(validate_config(&config).is_ok());
        assert_eq!(config.polling.orders_interval_secs, 10);
        assert_eq!(config.polling.store_status_interval_secs, 120);
        assert_eq!(config.view.default_page_size, 10);
        assert_eq!(config.engine.log_level, "info");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config: AppConfig = toml::from_str(
            r#"
            [engine]
            name = "orders-screen"

            [api]
            base_url = "https://merchant-api.example.com"

            [polling]
            orders_interval_secs = 0
            "#,
        )
        .unwrap();

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let config: AppConfig = toml::from_str(
            r#"
            [engine]
            name = "orders-screen"

            [api]
            base_url = "ftp://nope"
            "#,
        )
        .unwrap();

        assert!(validate_config(&config).is_err());
    }
}
