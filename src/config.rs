use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::env;
use std::time::Duration;

pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:5174";

/// 25 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Upper bound on a single extraction run.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: parse_origins(DEFAULT_ALLOWED_ORIGINS),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            extraction: ExtractionConfig {
                timeout: Duration::from_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: parse_origins(
                    &env::var("ALLOWED_ORIGINS")
                        .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
                ),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
                    .parse()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
            },
            extraction: ExtractionConfig {
                timeout: Duration::from_secs(
                    env::var("EXTRACTION_TIMEOUT_SECS")
                        .unwrap_or_else(|_| DEFAULT_EXTRACTION_TIMEOUT_SECS.to_string())
                        .parse()
                        .context("EXTRACTION_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later, at router construction or first request.
    pub fn validate(&self) -> Result<()> {
        for origin in &self.server.cors_allowed_origins {
            HeaderValue::from_str(origin)
                .with_context(|| format!("invalid CORS origin in ALLOWED_ORIGINS: {origin:?}"))?;
        }
        if self.server.max_upload_bytes == 0 {
            anyhow::bail!("MAX_UPLOAD_BYTES must be greater than zero");
        }
        if self.extraction.timeout.is_zero() {
            anyhow::bail!("EXTRACTION_TIMEOUT_SECS must be greater than zero");
        }
        Ok(())
    }
}

/// Split a comma-separated origin list, dropping blank entries.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(
            config.server.cors_allowed_origins,
            vec!["http://localhost:5173", "http://localhost:5174"]
        );
        assert_eq!(config.server.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(config.extraction.timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_origins_trims_and_skips_blanks() {
        let origins = parse_origins(" https://a.example , ,https://b.example,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        let mut config = Config::default();
        config.server.cors_allowed_origins = vec!["http://bad\norigin".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.server.max_upload_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extraction.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
