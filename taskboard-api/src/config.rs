/// Configuration management for the API server
///
/// Configuration is loaded from environment variables, with an optional
/// `.env` file for development.
///
/// # Environment Variables
///
/// - `API_HOST`: Bind address (default: "0.0.0.0")
/// - `API_PORT`: Listen port (default: 8080)
/// - `DATABASE_URL`: PostgreSQL URL; when unset the in-memory store is used
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Signing secret, at least 32 characters (required)
/// - `JWT_EXPIRES_SECONDS`: Session lifetime (default: 7200)
/// - `INVITATION_TTL_SECONDS`: Invitation lifetime (default: 86400)
/// - `STREAM_QUEUE_CAPACITY`: Per-subscriber event queue size (default: 256)
/// - `CORS_ORIGINS`: Comma-separated origins, or "*" (default: "*")
/// - `LOG_FORMAT`: "json" for JSON logs, anything else for text
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// let config = Config::from_env().expect("Failed to load config");
/// println!("Listening on {}", config.bind_address());
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use taskboard_shared::auth::jwt::DEFAULT_EXPIRES_SECONDS;
use taskboard_shared::services::membership::DEFAULT_INVITATION_TTL_SECONDS;

/// Upper bound for token and invitation lifetimes (ten years)
pub const MAX_LIFETIME_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    /// `None` selects the in-memory store
    pub database: Option<DatabaseConfig>,

    pub jwt: JwtConfig,

    pub invitations: InvitationConfig,

    pub stream: StreamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Emit JSON log lines
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 secret
    #[serde(skip_serializing)]
    pub secret: String,

    /// Session lifetime in seconds
    pub expires_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Lifetime of a new invitation in seconds
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Per-subscriber queue capacity
    pub queue_capacity: usize,

    /// Seconds between SSE keep-alive comments
    pub keep_alive_seconds: u64,
}

fn parse_var<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e))
}

fn parse_lifetime(name: &str, default: i64) -> anyhow::Result<i64> {
    check_lifetime(name, parse_var(name, &default.to_string())?)
}

/// Lifetimes are added to `Utc::now()`, so they must stay well inside
/// chrono's range
fn check_lifetime(name: &str, seconds: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_LIFETIME_SECONDS).contains(&seconds) {
        anyhow::bail!("{} must be between 1 and {} seconds", name, MAX_LIFETIME_SECONDS);
    }
    Ok(seconds)
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Fails if `JWT_SECRET` is missing or shorter than 32 characters, or if
    /// a numeric variable doesn't parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = parse_var::<u16>("API_PORT", "8080")?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let json_logs = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", "10")?,
            }),
            _ => None,
        };

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expires_seconds = parse_lifetime("JWT_EXPIRES_SECONDS", DEFAULT_EXPIRES_SECONDS)?;
        let ttl_seconds = parse_lifetime("INVITATION_TTL_SECONDS", DEFAULT_INVITATION_TTL_SECONDS)?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                json_logs,
            },
            database,
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_seconds,
            },
            invitations: InvitationConfig { ttl_seconds },
            stream: StreamConfig {
                queue_capacity: parse_var("STREAM_QUEUE_CAPACITY", "256")?,
                keep_alive_seconds: 15,
            },
        })
    }

    /// Configuration for tests: in-memory store, fixed secret
    pub fn for_tests() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                json_logs: false,
            },
            database: None,
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expires_seconds: DEFAULT_EXPIRES_SECONDS,
            },
            invitations: InvitationConfig {
                ttl_seconds: DEFAULT_INVITATION_TTL_SECONDS,
            },
            stream: StreamConfig {
                queue_capacity: 256,
                keep_alive_seconds: 15,
            },
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = Config::for_tests();
        config.api.port = 8080;
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_secret_not_serialized() {
        let json = serde_json::to_value(Config::for_tests()).expect("serialize");
        assert!(json["jwt"].get("secret").is_none());
        assert_eq!(json["jwt"]["expires_seconds"], 7200);
    }

    #[test]
    fn test_parse_var_default_and_error() {
        let port: u16 = parse_var("TASKBOARD_TEST_UNSET_PORT", "9000").expect("default parses");
        assert_eq!(port, 9000);

        let bad = parse_var::<u16>("TASKBOARD_TEST_UNSET_PORT", "not-a-port");
        assert!(bad.is_err());
    }

    #[test]
    fn test_lifetime_bounds() {
        assert_eq!(check_lifetime("TTL", 1).expect("min"), 1);
        assert_eq!(
            check_lifetime("TTL", MAX_LIFETIME_SECONDS).expect("max"),
            MAX_LIFETIME_SECONDS
        );
        assert!(check_lifetime("TTL", 0).is_err());
        assert!(check_lifetime("TTL", -5).is_err());
        assert!(check_lifetime("TTL", MAX_LIFETIME_SECONDS + 1).is_err());
        assert!(check_lifetime("TTL", i64::MAX).is_err());

        let defaulted = parse_lifetime("TASKBOARD_TEST_UNSET_TTL", DEFAULT_INVITATION_TTL_SECONDS)
            .expect("default in range");
        assert_eq!(defaulted, 86_400);
    }

    #[test]
    fn test_max_lifetime_fits_chrono() {
        let ttl = chrono::Duration::seconds(MAX_LIFETIME_SECONDS);
        assert!(chrono::Utc::now().checked_add_signed(ttl).is_some());
    }
}
