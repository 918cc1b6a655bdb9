//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Dispatch configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Report dispatch configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DispatchConfig {
    /// Straight-line radius in kilometres within which an NGO is offered a report.
    #[serde(default = "default_match_radius_km")]
    pub match_radius_km: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            match_radius_km: default_match_radius_km(),
        }
    }
}

/// Default NGO match radius in kilometres.
pub const DEFAULT_MATCH_RADIUS_KM: f64 = 25.0;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_match_radius_km() -> f64 {
    DEFAULT_MATCH_RADIUS_KM
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, exported into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `PAWLINK_ENV`)
    /// 4. Environment variables with `PAWLINK__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("PAWLINK_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PAWLINK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_source(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PAWLINK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_source(config)
    }

    fn from_source(source: config::Config) -> Result<Self, config::ConfigError> {
        let config: Self = source.try_deserialize()?;
        config.dispatch.validate()?;
        Ok(config)
    }
}

impl DispatchConfig {
    /// Rejects a radius that no NGO could ever fall within.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.match_radius_km.is_finite() && self.match_radius_km > 0.0 {
            Ok(())
        } else {
            Err(config::ConfigError::Message(format!(
                "dispatch.match_radius_km must be a positive number of kilometres, got {}",
                self.match_radius_km
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn try_parse(toml: &str) -> Result<Config, config::ConfigError> {
        let source = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Config::from_source(source)
    }

    fn parse(toml: &str) -> Config {
        try_parse(toml).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse(
            r#"
            [database]
            url = "postgres://localhost/pawlink"
            "#,
        );

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.dispatch.match_radius_km, DEFAULT_MATCH_RADIUS_KM);
    }

    #[test]
    fn test_match_radius_override() {
        let config = parse(
            r#"
            [database]
            url = "postgres://localhost/pawlink"

            [dispatch]
            match_radius_km = 10.5
            "#,
        );
        assert_eq!(config.dispatch.match_radius_km, 10.5);
    }

    #[test]
    fn test_non_positive_match_radius_rejected() {
        for radius in ["0.0", "-5.0", "-0.01"] {
            let result = try_parse(&format!(
                r#"
                [database]
                url = "postgres://localhost/pawlink"

                [dispatch]
                match_radius_km = {radius}
                "#
            ));
            assert!(
                matches!(result, Err(config::ConfigError::Message(_))),
                "radius {radius} accepted"
            );
        }
    }
}
