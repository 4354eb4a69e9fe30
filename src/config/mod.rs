use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL; `None` means the server cannot start against Postgres.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub list_per_page: u32,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub session_sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub source: String,
    pub flush_interval_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set outside development")]
    MissingJwtSecret,

    #[error("BCRYPT_COST must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),

    #[error("SECURITY_JWT_EXPIRY_HOURS must be between 1 and {}, got {0}", MAX_JWT_EXPIRY_HOURS)]
    InvalidJwtExpiry(u64),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

const DEV_JWT_SECRET: &str = "dev-only-pizza-secret";

/// Upper bound on token lifetime, one year.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(v) = env::var("PIZZA_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_LIST_PER_PAGE") {
            self.api.list_per_page = v.parse().unwrap_or(self.api.list_per_page);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_SESSION_SWEEP_INTERVAL_SECS") {
            self.security.session_sweep_interval_secs =
                v.parse().unwrap_or(self.security.session_sweep_interval_secs);
        }

        // Metrics overrides
        if let Ok(v) = env::var("METRICS_SOURCE") {
            self.metrics.source = v;
        }
        if let Ok(v) = env::var("METRICS_FLUSH_INTERVAL_SECS") {
            self.metrics.flush_interval_secs = v.parse().unwrap_or(self.metrics.flush_interval_secs);
        }

        self
    }

    /// Rejects settings the server must not boot with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dev_secret = self.security.jwt_secret.is_empty() || self.security.jwt_secret == DEV_JWT_SECRET;
        if self.environment != Environment::Development && dev_secret {
            return Err(ConfigError::MissingJwtSecret);
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.security.bcrypt_cost));
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::InvalidJwtExpiry(self.security.jwt_expiry_hours));
        }
        if self.security.session_sweep_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("SECURITY_SESSION_SWEEP_INTERVAL_SECS"));
        }
        if self.metrics.flush_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("METRICS_FLUSH_INTERVAL_SECS"));
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                list_per_page: 10,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                bcrypt_cost: 10,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                session_sweep_interval_secs: 3600,
            },
            metrics: MetricsConfig {
                source: "jwt-pizza-service-dev".to_string(),
                flush_interval_secs: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                list_per_page: 10,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 12,
                cors_origins: vec!["https://staging.pizza.example.com".to_string()],
                session_sweep_interval_secs: 900,
            },
            metrics: MetricsConfig {
                source: "jwt-pizza-service-staging".to_string(),
                flush_interval_secs: 10,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 3000,
                list_per_page: 10,
                enable_request_logging: true,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 12,
                bcrypt_cost: 12,
                cors_origins: vec!["https://pizza.example.com".to_string()],
                session_sweep_interval_secs: 300,
            },
            metrics: MetricsConfig {
                source: "jwt-pizza-service".to_string(),
                flush_interval_secs: 10,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.list_per_page, 10);
        assert_eq!(config.security.jwt_secret, DEV_JWT_SECRET);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let mut config = AppConfig::production();
        assert!(matches!(config.validate(), Err(ConfigError::MissingJwtSecret)));

        config.security.jwt_secret = DEV_JWT_SECRET.to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingJwtSecret)));

        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 3;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBcryptCost(3))));
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        let mut config = AppConfig::development();
        config.metrics.flush_interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval("METRICS_FLUSH_INTERVAL_SECS"))
        ));

        let mut config = AppConfig::development();
        config.security.session_sweep_interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval("SECURITY_SESSION_SWEEP_INTERVAL_SECS"))
        ));
    }

    #[test]
    fn test_jwt_expiry_bounds() {
        let mut config = AppConfig::development();
        config.security.jwt_expiry_hours = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJwtExpiry(u64::MAX))));

        config.security.jwt_expiry_hours = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJwtExpiry(0))));

        config.security.jwt_expiry_hours = MAX_JWT_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
    }
}
