//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use shopkeep_checkout::CheckoutConfig;
use shopkeep_db::DbConfig;

/// Secret used when `JWT_SECRET` is not set. Development only.
pub const DEV_JWT_SECRET: &str = "shopkeep-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Maximum pooled SQLite connections
    pub max_connections: u32,

    /// HMAC secret for verifying bearer tokens
    pub jwt_secret: String,

    /// Per-attempt checkout deadline; `None` disables it
    pub checkout_timeout: Option<Duration>,

    /// Load the sample catalog into an empty database on startup
    pub seed_sample_data: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ApiConfig {
            port: parse_or(&lookup, "SHOPKEEP_PORT", 3000)?,

            database_path: lookup("SHOPKEEP_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./shopkeep.db")),

            max_connections: parse_or(&lookup, "SHOPKEEP_DB_MAX_CONNECTIONS", 5)?,

            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),

            // 0 turns the deadline off
            checkout_timeout: match parse_or(&lookup, "SHOPKEEP_CHECKOUT_TIMEOUT_MS", 10_000u64)? {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },

            seed_sample_data: parse_or(&lookup, "SHOPKEEP_SEED", false)?,
        };

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "SHOPKEEP_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }

    pub fn checkout_config(&self) -> CheckoutConfig {
        match self.checkout_timeout {
            Some(timeout) => CheckoutConfig::new().timeout(timeout),
            None => CheckoutConfig::new().without_timeout(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.database_path, PathBuf::from("./shopkeep.db"));
        assert_eq!(config.checkout_timeout, Some(Duration::from_secs(10)));
        assert!(!config.seed_sample_data);
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SHOPKEEP_PORT", "8080"),
            ("SHOPKEEP_DB_PATH", "/tmp/shop.db"),
            ("JWT_SECRET", "s3cret"),
            ("SHOPKEEP_CHECKOUT_TIMEOUT_MS", "0"),
            ("SHOPKEEP_SEED", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.checkout_timeout, None);
        assert_eq!(config.checkout_config().timeout, None);
        assert!(config.seed_sample_data);
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("SHOPKEEP_PORT", "http")]),
            Err(ConfigError::InvalidValue(key)) if key == "SHOPKEEP_PORT"
        ));
        assert!(matches!(
            load(&[("JWT_SECRET", "")]),
            Err(ConfigError::MissingRequired(_))
        ));
        assert!(load(&[("SHOPKEEP_DB_MAX_CONNECTIONS", "0")]).is_err());
    }
}
