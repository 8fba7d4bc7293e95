/// Configuration management for Watch Service
///
/// This module handles loading and managing configuration from environment
/// variables.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Login rate limiter configuration
    pub rate_limit: RateLimitConfig,
    /// Suspicious-activity detection thresholds
    pub abuse: AbuseConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Per-statement acquire/query timeout in milliseconds
    pub statement_timeout_ms: u64,
}

/// Login rate limiter configuration.
///
/// The limiter is process-local and volatile; these knobs control the
/// sliding window and the escalating lockout. The service itself exposes no
/// login route: the embedding login flow is expected to construct a
/// `security::LoginRateLimiter` from this section and consume it in-process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Failures within the window before a lockout triggers
    pub max_failures: u32,
    /// Sliding window length in seconds
    pub window_seconds: u64,
    /// First lockout duration in seconds
    pub base_lockout_seconds: u64,
    /// Upper bound for escalated lockouts in seconds
    pub max_lockout_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 900,
            base_lockout_seconds: 60,
            max_lockout_seconds: 3600,
        }
    }
}

/// Thresholds for suspicious-playback detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbuseConfig {
    /// Largest tolerated jump of an event timestamp past the recorded
    /// watched progress, in seconds
    pub max_timestamp_jump_seconds: f64,
    /// Active sessions a single viewer may hold before events are flagged
    pub max_concurrent_sessions: i64,
}

impl Default for AbuseConfig {
    fn default() -> Self {
        Self {
            max_timestamp_jump_seconds: 600.0,
            max_concurrent_sessions: 3,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("WATCH_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("WATCH_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8085),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if app_env.eq_ignore_ascii_case("production") && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/watch".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
                statement_timeout_ms: std::env::var("DATABASE_STATEMENT_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5_000),
            },
            rate_limit: RateLimitConfig {
                max_failures: env_or("LOGIN_RATE_LIMIT_MAX_FAILURES", 5),
                window_seconds: env_or("LOGIN_RATE_LIMIT_WINDOW_SECONDS", 900),
                base_lockout_seconds: env_or("LOGIN_RATE_LIMIT_BASE_LOCKOUT_SECONDS", 60),
                max_lockout_seconds: env_or("LOGIN_RATE_LIMIT_MAX_LOCKOUT_SECONDS", 3600),
            },
            abuse: AbuseConfig {
                max_timestamp_jump_seconds: env_or("ABUSE_MAX_TIMESTAMP_JUMP_SECONDS", 600.0),
                max_concurrent_sessions: env_or("ABUSE_MAX_CONCURRENT_SESSIONS", 3),
            },
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_defaults() {
        let cfg = RateLimitConfig::default();
        assert_eq!(cfg.max_failures, 5);
        assert_eq!(cfg.window_seconds, 900);
        assert_eq!(cfg.base_lockout_seconds, 60);
        assert_eq!(cfg.max_lockout_seconds, 3600);
        assert!(cfg.base_lockout_seconds <= cfg.max_lockout_seconds);
    }

    #[test]
    fn abuse_defaults() {
        let cfg = AbuseConfig::default();
        assert_eq!(cfg.max_timestamp_jump_seconds, 600.0);
        assert_eq!(cfg.max_concurrent_sessions, 3);
    }
}
