//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the file named by `STREAMCREDIT_CONFIG`) and
//! deserializes into strongly-typed structs. Every section and field has a
//! default, so a partial file only overrides what it names.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::credit::CreditPolicy;
use crate::fraud::{validate_significance_level, FraudConfig};
use crate::types::CreditError;

/// Environment variable that overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "STREAMCREDIT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub fraud: FraudConfig,
    pub credit: CreditPolicy,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mount point of the versioned API, e.g. `/api/v1`.
    pub api_prefix: String,
    /// Allowed CORS origins. `"*"` allows any.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            api_prefix: "/api/v1".into(),
            cors_origins: vec![
                "http://localhost:3000".into(),
                "http://localhost:8000".into(),
            ],
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Invalid config file: {path}"))?;
        Ok(config)
    }

    /// Like [`AppConfig::load`], but a missing file yields defaults.
    /// A file that exists and fails to parse is still an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!(path, "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Config path from `STREAMCREDIT_CONFIG`, falling back to `config.toml`.
    pub fn path_from_env() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Parse TOML text and validate it.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CreditError> {
        validate_significance_level(self.fraud.significance_level)?;

        let (min, max) = (self.fraud.digit_one_min_pct, self.fraud.digit_one_max_pct);
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(min) || !in_range(max) || min > max {
            return Err(CreditError::InvalidConfig(format!(
                "digit-1 band [{min}, {max}] must satisfy 0 <= min <= max <= 100"
            )));
        }

        let credit = &self.credit;
        for (name, value) in [
            ("mar_threshold", credit.mar_threshold),
            ("aov_threshold", credit.aov_threshold),
            ("credit_multiplier", credit.credit_multiplier),
            ("max_credit_limit", credit.max_credit_limit),
        ] {
            if value <= Decimal::ZERO {
                return Err(CreditError::InvalidConfig(format!(
                    "credit.{name} must be positive, got {value}"
                )));
            }
        }

        let prefix = self.server.api_prefix.trim_end_matches('/');
        if prefix.is_empty() || !prefix.starts_with('/') {
            return Err(CreditError::InvalidConfig(format!(
                "server.api_prefix must be a non-root path like \"/api/v1\", got {:?}",
                self.server.api_prefix
            )));
        }

        Ok(())
    }
}
