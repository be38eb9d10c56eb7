//! Configuration loading and validation.
//!
//! All values are read from environment variables at startup. The process
//! exits with a clear error message if any required variable is missing or
//! invalid.
//!
//! Only the process environment is consulted. A `.env` file in the working
//! directory is not loaded; export its variables before starting the service
//! (for example `set -a; . ./.env; set +a`).

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::KEY_LEN;
use crate::portal::DEFAULT_BASE_URL;

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// AES-256 key used to encrypt stored PINs; exactly 32 bytes. **Required.**
    pub secret_key: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file. Created if missing.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Base URL of the student portal.
    #[serde(default = "default_portal_base_url")]
    pub portal_base_url: String,

    /// Per-request timeout for portal calls.
    #[serde(default = "default_portal_timeout")]
    pub portal_timeout_secs: u64,

    /// Tracing log level (e.g. `"info"`, `"debug"`). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP collector endpoint. Span export is off when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

fn default_port() -> u16 {
    9090
}
fn default_database_path() -> String {
    "estudiantes.db".into()
}
fn default_portal_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_portal_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.secret_key.len() != KEY_LEN {
            anyhow::bail!(
                "SECRET_KEY must be exactly {KEY_LEN} bytes (got {})",
                self.secret_key.len()
            );
        }
        if self.portal_base_url.trim().is_empty() {
            anyhow::bail!("PORTAL_BASE_URL must not be empty");
        }
        if self.database_path.trim().is_empty() {
            anyhow::bail!("DATABASE_PATH must not be empty");
        }
        if self.portal_timeout_secs == 0 {
            anyhow::bail!("PORTAL_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret_key", &"[redacted]")
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("portal_base_url", &self.portal_base_url)
            .field("portal_timeout_secs", &self.portal_timeout_secs)
            .field("log_level", &self.log_level)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            secret_key: "0123456789abcdef0123456789abcdef".into(),
            port: default_port(),
            database_path: default_database_path(),
            portal_base_url: default_portal_base_url(),
            portal_timeout_secs: default_portal_timeout(),
            log_level: default_log_level(),
            otel_exporter_otlp_endpoint: None,
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_port(), 9090);
        assert_eq!(default_database_path(), "estudiantes.db");
        assert_eq!(default_portal_base_url(), "https://portal.upds.edu.bo");
        assert_eq!(default_portal_timeout(), 30);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_32_byte_key() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_key() {
        let cfg = Config {
            secret_key: "too-short".into(),
            ..valid()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("SECRET_KEY"));
    }

    #[test]
    fn validate_rejects_long_key() {
        let cfg = Config {
            secret_key: "0123456789abcdef0123456789abcdef!".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let cfg = Config {
            portal_timeout_secs: 0,
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_redacts_secret_key() {
        let out = format!("{:?}", valid());
        assert!(!out.contains("0123456789abcdef"));
        assert!(out.contains("[redacted]"));
    }
}
