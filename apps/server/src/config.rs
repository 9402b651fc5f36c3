//! # Server Configuration
//!
//! Configuration for the HTTP server, database, image storage and locale.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKLY_PORT=9000                                                  │
//! │     STOCKLY_DB_PATH=/var/lib/stockly/stockly.db                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/stockly/server.toml (Linux)                              │
//! │     ~/Library/Application Support/stockly/server.toml (macOS)          │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # server.toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//! max_body_bytes = 10485760
//!
//! [database]
//! path = "./stockly.db"
//! max_connections = 5
//!
//! [storage]
//! image_dir = "./data/images"
//! public_base_url = "http://localhost:8080/images"
//!
//! [locale]
//! utc_offset_minutes = -300   # dashboard day boundaries
//! currency_symbol = "$"
//! currency_decimals = 2
//! default_tax_percent = 10.0
//! ```

use std::path::PathBuf;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use stockly_core::money::{Money, Percentage};
use stockly_core::DEFAULT_TAX_PERCENT;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Sections
// =============================================================================

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body (image uploads included).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stockly.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory uploaded images are written to and served from.
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// URL prefix stored on products; should point at `/images`.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("./data/images")
}

fn default_public_base_url() -> String {
    "http://localhost:8080/images".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            image_dir: default_image_dir(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// `[locale]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleSettings {
    /// Offset from UTC used to bucket revenue by calendar day.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u8,

    /// Tax percentage a new invoice form starts with. Requests without one are taxed at 0.
    #[serde(default = "default_tax_percent")]
    pub default_tax_percent: f64,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_currency_decimals() -> u8 {
    2
}

fn default_tax_percent() -> f64 {
    DEFAULT_TAX_PERCENT
}

impl Default for LocaleSettings {
    fn default() -> Self {
        LocaleSettings {
            utc_offset_minutes: 0,
            currency_symbol: default_currency_symbol(),
            currency_decimals: default_currency_decimals(),
            default_tax_percent: default_tax_percent(),
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub locale: LocaleSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, or `server.toml` in the platform config dir)
    /// 3. Environment variables
    ///
    /// An explicit `config_path` that does not exist is an error; a missing
    /// default file is not.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match config_path {
            Some(path) => {
                info!(?path, "Loading server config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            }
            None => {
                if let Some(path) = Self::default_config_path() {
                    if path.exists() {
                        info!(?path, "Loading server config from file");
                        let contents = std::fs::read_to_string(&path)?;
                        config = toml::from_str(&contents)?;
                    } else {
                        debug!(?path, "Config file not found, using defaults");
                    }
                }
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        let url = &self.storage.public_base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "public_base_url must be an http(s) URL or an absolute path, got: {}",
                url
            )));
        }

        self.utc_offset()?;

        let tax = self.locale.default_tax_percent;
        if !tax.is_finite() || !(0.0..=100.0).contains(&tax) {
            return Err(ConfigError::Invalid(format!(
                "default_tax_percent must be between 0 and 100, got: {}",
                tax
            )));
        }

        if self.locale.currency_decimals > 4 {
            return Err(ConfigError::Invalid(
                "currency_decimals must be at most 4".into(),
            ));
        }

        Ok(())
    }

    /// Applies `STOCKLY_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = var("STOCKLY_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = var("STOCKLY_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.server.port = p;
                }
                Err(_) => warn!(port = %port, "Ignoring invalid STOCKLY_PORT"),
            }
        }

        if let Some(path) = var("STOCKLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = var("STOCKLY_DB_MAX_CONNECTIONS") {
            if let Ok(m) = max.parse::<u32>() {
                self.database.max_connections = m;
            }
        }

        if let Some(dir) = var("STOCKLY_IMAGE_DIR") {
            self.storage.image_dir = PathBuf::from(dir);
        }

        if let Some(url) = var("STOCKLY_PUBLIC_BASE_URL") {
            self.storage.public_base_url = url;
        }

        if let Some(offset) = var("STOCKLY_UTC_OFFSET_MINUTES") {
            match offset.parse::<i32>() {
                Ok(m) => self.locale.utc_offset_minutes = m,
                Err(_) => warn!(offset = %offset, "Ignoring invalid STOCKLY_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(tax) = var("STOCKLY_TAX_PERCENT") {
            if let Ok(t) = tax.parse::<f64>() {
                self.locale.default_tax_percent = t;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "stockly")
            .map(|dirs| dirs.config_dir().join("server.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The locale's offset from UTC.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.locale
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "utc_offset_minutes out of range: {}",
                    self.locale.utc_offset_minutes
                ))
            })
    }

    /// Tax percentage suggested to the invoice form.
    pub fn default_tax(&self) -> Percentage {
        Percentage::sanitize(self.locale.default_tax_percent)
    }

    /// Formats an amount for display, rounding to the currency's decimals.
    ///
    /// ## Example
    /// ```rust
    /// use stockly_core::money::Money;
    /// use stockly_server::config::ServerConfig;
    ///
    /// let config = ServerConfig::default();
    /// assert_eq!(config.format_currency(Money::new(12.345)), "$12.35");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let decimals = u32::from(self.locale.currency_decimals);
        let divisor = 10_i64.pow(decimals);
        let units = (amount.amount() * divisor as f64).round() as i64;
        let whole = units / divisor;
        let frac = (units % divisor).abs();

        format!(
            "{}{}{}",
            if units < 0 { "-" } else { "" },
            self.locale.currency_symbol,
            if decimals > 0 {
                format!("{}.{:0width$}", whole.abs(), frac, width = decimals as usize)
            } else {
                whole.abs().to_string()
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.default_tax().value(), 10.0);
        assert_eq!(config.utc_offset().unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn test_toml_sections_fill_in_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [locale]
            utc_offset_minutes = -300
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.locale.currency_symbol, "$");
        assert_eq!(
            config.utc_offset().unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap()
        );
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STOCKLY_PORT", "9100"),
            ("STOCKLY_DB_PATH", "/tmp/x.db"),
            ("STOCKLY_TAX_PERCENT", "8.25"),
            ("STOCKLY_UTC_OFFSET_MINUTES", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.database.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.locale.default_tax_percent, 8.25);
        assert_eq!(config.locale.utc_offset_minutes, 0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig::default();

        config.locale.utc_offset_minutes = 24 * 60;
        assert!(config.validate().is_err());
        config.locale.utc_offset_minutes = 330;
        assert!(config.validate().is_ok());

        config.locale.default_tax_percent = 150.0;
        assert!(config.validate().is_err());
        config.locale.default_tax_percent = 0.0;

        config.storage.public_base_url = "ftp://images".into();
        assert!(config.validate().is_err());
        config.storage.public_base_url = "/images".into();
        assert!(config.validate().is_ok());

        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = ServerConfig::load(Some(PathBuf::from("/nonexistent/stockly/server.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_format_currency() {
        let config = ServerConfig::default();
        assert_eq!(config.format_currency(Money::new(12.34)), "$12.34");
        assert_eq!(config.format_currency(Money::new(184.68)), "$184.68");
        assert_eq!(config.format_currency(Money::new(0.005)), "$0.01");
        assert_eq!(config.format_currency(Money::zero()), "$0.00");
        assert_eq!(config.format_currency(Money::new(-12.34)), "-$12.34");
    }

    #[test]
    fn test_format_currency_no_decimals() {
        let mut config = ServerConfig::default();
        config.locale.currency_symbol = "¥".into();
        config.locale.currency_decimals = 0;
        assert_eq!(config.format_currency(Money::new(1234.4)), "¥1234");
    }
}
