//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `config.toml`. Polling
//! cadences and API endpoints are externalized here - nothing is
//! hardcoded in the domain layer.

pub mod loader;

use serde::Deserialize;

/// Top-level engine configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before polling begins.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Engine identity and logging.
    pub engine: EngineConfig,
    /// Merchant backend API endpoints.
    pub api: ApiConfig,
    /// Polling cadences.
    #[serde(default)]
    pub polling: PollingConfig,
    /// View defaults.
    #[serde(default)]
    pub view: ViewConfig,
}

/// Engine identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Human-readable instance name.
    pub name: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Merchant backend base URL.
    pub base_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum retries on transient errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Polling cadence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Order collection cadence (reference: 10 s).
    #[serde(default = "default_orders_interval")]
    pub orders_interval_secs: u64,
    /// Store status cadence (reference: 120 s).
    #[serde(default = "default_store_status_interval")]
    pub store_status_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            orders_interval_secs: default_orders_interval(),
            store_status_interval_secs: default_store_status_interval(),
        }
    }
}

/// View defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    /// Default page size for the orders table.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

// Default value functions for serde

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_orders_interval() -> u64 {
    10
}

fn default_store_status_interval() -> u64 {
    120
}

fn default_page_size() -> usize {
    10
}
