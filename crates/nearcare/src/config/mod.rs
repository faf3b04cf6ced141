//! Service configuration.
//!
//! [`ServiceConfig::from_env`] reads the process environment (after loading an
//! optional `.env`), and [`ServiceConfigBuilder`] starts from the same
//! defaults for programmatic use and tests.

use std::{fmt::Display, path::PathBuf, str::FromStr};

use tracing::{debug, info};

use crate::error::{NearcareError, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Nominatim asks every client to identify itself.
pub fn default_user_agent() -> String {
    format!("NearCare/{}", env!("CARGO_PKG_VERSION"))
}

/// Connection details for the geocoding service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

/// Page size applied when the client sends none, and the largest accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub geocoder: GeocoderConfig,
    pub pagination: PaginationConfig,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: nearcare_data::default_data_dir(),
            geocoder: GeocoderConfig::default(),
            pagination: PaginationConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognised variables: `NEARCARE_HOST`, `PORT`, `DATA_DIR`,
    /// `GEOCODER_BASE_URL`, `GEOCODER_USER_AGENT`, `DEFAULT_PAGE_LIMIT`,
    /// `MAX_PAGE_LIMIT` and `LOG_LEVEL`.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => info!(path = ?path, "Loaded environment file"),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => return Err(NearcareError::ConfigError(format!("Invalid .env file: {e}"))),
        }

        let defaults = Self::default();
        ServiceConfigBuilder::new()
            .host(env_or("NEARCARE_HOST", defaults.host)?)
            .port(env_or("PORT", defaults.port)?)
            .data_dir(env_or("DATA_DIR", defaults.data_dir)?)
            .geocoder_base_url(env_or("GEOCODER_BASE_URL", defaults.geocoder.base_url)?)
            .user_agent(env_or("GEOCODER_USER_AGENT", defaults.geocoder.user_agent)?)
            .default_limit(env_or("DEFAULT_PAGE_LIMIT", defaults.pagination.default_limit)?)
            .max_limit(env_or("MAX_PAGE_LIMIT", defaults.pagination.max_limit)?)
            .log_level(env_or("LOG_LEVEL", defaults.log_level)?)
            .build()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| NearcareError::ConfigError(format!("Invalid {key} value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

/// Builder for [`ServiceConfig`]; `build` checks the values are coherent.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Create a new builder with the defaults
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    /// Set the address to bind
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the listening port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the directory holding the facility parquet file and visitor total
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the Nominatim base URL
    pub fn geocoder_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.geocoder.base_url = url.into();
        self
    }

    /// Set the User-Agent sent to the geocoder
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.geocoder.user_agent = user_agent.into();
        self
    }

    /// Set the page size used when a request gives none
    pub fn default_limit(mut self, limit: u32) -> Self {
        self.config.pagination.default_limit = limit;
        self
    }

    /// Set the largest page size a request may ask for
    pub fn max_limit(mut self, limit: u32) -> Self {
        self.config.pagination.max_limit = limit;
        self
    }

    /// Set the default log level (`RUST_LOG` still wins)
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Validate the page limits and build the final configuration
    pub fn build(mut self) -> Result<ServiceConfig> {
        let pagination = self.config.pagination;
        if pagination.default_limit == 0 || pagination.default_limit > pagination.max_limit {
            return Err(NearcareError::ConfigError(format!(
                "Default page limit must be between 1 and {}, got {}",
                pagination.max_limit, pagination.default_limit
            )));
        }
        if self.config.geocoder.user_agent.trim().is_empty() {
            return Err(NearcareError::ConfigError(
                "Geocoder user agent must not be empty".to_string(),
            ));
        }
        let trimmed = self.config.geocoder.base_url.trim_end_matches('/').len();
        self.config.geocoder.base_url.truncate(trimmed);
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::builder().build().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.geocoder.base_url, DEFAULT_GEOCODER_URL);
        assert!(config.geocoder.user_agent.starts_with("NearCare/"));
        assert_eq!(config.pagination.default_limit, 20);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_builder_overrides() {
        let config = ServiceConfig::builder()
            .host("127.0.0.1")
            .port(8080)
            .geocoder_base_url("http://localhost:7070/")
            .default_limit(5)
            .max_limit(10)
            .build()
            .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.geocoder.base_url, "http://localhost:7070");
        assert_eq!(config.pagination.max_limit, 10);
    }

    #[test]
    fn test_incoherent_limits_rejected() {
        let result = ServiceConfig::builder()
            .default_limit(50)
            .max_limit(10)
            .build();
        assert!(matches!(result, Err(NearcareError::ConfigError(_))));

        let result = ServiceConfig::builder().default_limit(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_user_agent_rejected() {
        let result = ServiceConfig::builder().user_agent("  ").build();
        assert!(matches!(result, Err(NearcareError::ConfigError(_))));
    }
}
