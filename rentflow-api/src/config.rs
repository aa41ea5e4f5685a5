/// Configuration management for the API server
///
/// Configuration comes from environment variables; a `.env` file in the
/// working directory is loaded first when present.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `DATABASE_ACQUIRE_TIMEOUT_SECONDS`: Wait for a free connection (default: 5)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `JWT_SECRET`: HS256 signing secret, at least 32 characters (required)
/// - `JWT_EXPIRES_IN_HOURS`: Token lifetime (default: 24)
/// - `REQUEST_TIMEOUT_SECONDS`: Per-request deadline (default: 30)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `RUST_LOG`: Log filter (default: rentflow_api=debug,rentflow_shared=debug,tower_http=debug)

use rentflow_shared::db::pool::DatabaseConfig as PoolConfig;
use serde::{Deserialize, Serialize};
use std::{env, str::FromStr, time::Duration};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Requests running longer than this are answered with 408
    pub request_timeout_seconds: u64,

    /// `["*"]` allows any origin
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 secret; generate with `openssl rand -hex 32`
    pub secret: String,

    pub expires_in_hours: i64,
}

impl Config {
    /// Loads configuration from the environment
    ///
    /// # Errors
    ///
    /// Fails when a required variable is missing, a number doesn't parse, or
    /// `JWT_SECRET` is shorter than 32 characters.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("API_PORT", 8080)?,
                request_timeout_seconds: parse_var("REQUEST_TIMEOUT_SECONDS", 30)?,
                cors_origins,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
                acquire_timeout_seconds: parse_var("DATABASE_ACQUIRE_TIMEOUT_SECONDS", 5)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in_hours: parse_var("JWT_EXPIRES_IN_HOURS", 24)?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_seconds)
    }

    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.expires_in_hours)
    }

    /// Settings for [`rentflow_shared::db::pool::create_pool`]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            acquire_timeout_seconds: self.database.acquire_timeout_seconds,
            ..Default::default()
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_seconds: 30,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/rentflow_test".to_string(),
                max_connections: 4,
                acquire_timeout_seconds: 3,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expires_in_hours: 24,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_pool_config_carries_database_settings() {
        let pool = test_config().pool_config();
        assert_eq!(pool.url, "postgresql://localhost/rentflow_test");
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.acquire_timeout_seconds, 3);
    }

    #[test]
    fn test_durations() {
        let config = test_config();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.token_lifetime(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_cors_wildcard() {
        let mut config = test_config();
        assert!(config.allows_any_origin());

        config.api.cors_origins = vec!["https://rentflow.example".to_string()];
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_parse_var_default_when_unset() {
        let value: u16 = parse_var("RENTFLOW_TEST_SURELY_UNSET_VARIABLE", 4242).unwrap();
        assert_eq!(value, 4242);
    }
}
