//! Application configuration

use std::env;

use time::Duration;

use crate::auth::{password, SigningSecret};

/// Longest accepted token lifetime (one year)
pub const MAX_JWT_EXPIRY_HOURS: i64 = 8760;

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub log_format: LogFormat,

    // Authentication
    pub jwt_secret: SigningSecret,
    pub jwt_expiry_hours: i64,
    pub password_hash_cost: u32,

    // Feature flags
    pub enable_signup: bool,

    // Seed account for the in-memory user store
    pub admin_email: Option<String>,
    pub admin_password_hash: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                Ok("pretty") | Err(_) => LogFormat::Pretty,
                Ok(_) => return Err(ConfigError::Invalid("LOG_FORMAT must be `json` or `pretty`")),
            },

            // Authentication
            jwt_secret: {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                if secret.is_empty() {
                    return Err(ConfigError::Missing("JWT_SECRET"));
                }
                // Reject short HMAC keys
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_SECRET must be at least 32 characters",
                    ));
                }
                SigningSecret::new(secret)
                    .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
            },
            jwt_expiry_hours: match env::var("JWT_EXPIRY_HOURS") {
                Err(_) => 24,
                Ok(raw) => match raw.parse::<i64>() {
                    Ok(hours) if (1..=MAX_JWT_EXPIRY_HOURS).contains(&hours) => hours,
                    _ => {
                        return Err(ConfigError::Invalid(
                            "JWT_EXPIRY_HOURS must be an integer between 1 and 8760",
                        ))
                    }
                },
            },
            password_hash_cost: match env::var("PASSWORD_HASH_COST") {
                Err(_) => password::DEFAULT_COST,
                Ok(raw) => match raw.parse::<u32>() {
                    Ok(cost) if (password::MIN_COST..=password::MAX_COST).contains(&cost) => cost,
                    _ => {
                        return Err(ConfigError::Invalid(
                            "PASSWORD_HASH_COST must be an integer between 1 and 31",
                        ))
                    }
                },
            },

            // Feature flags
            enable_signup: env::var("ENABLE_SIGNUP")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),

            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password_hash: env::var("ADMIN_PASSWORD_HASH").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Lifetime of issued access tokens
    pub fn token_ttl(&self) -> Duration {
        Duration::hours(self.jwt_expiry_hours)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BIND_ADDRESS",
        "LOG_FORMAT",
        "JWT_SECRET",
        "JWT_EXPIRY_HOURS",
        "PASSWORD_HASH_COST",
        "ENABLE_SIGNUP",
        "ADMIN_EMAIL",
        "ADMIN_PASSWORD_HASH",
    ];

    /// Helper to set required env vars for testing
    fn setup_minimal_config() {
        cleanup_config();
        env::set_var(
            "JWT_SECRET",
            "test-jwt-secret-must-be-at-least-32-characters-long",
        );
    }

    /// Helper to clear env vars after tests
    fn cleanup_config() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        setup_minimal_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.jwt_expiry_hours, 24);
        assert_eq!(config.token_ttl(), Duration::hours(24));
        assert_eq!(config.password_hash_cost, 12);
        assert!(config.enable_signup);
        assert!(config.admin_email.is_none());

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_secret_validation() {
        cleanup_config();
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));

        env::set_var("JWT_SECRET", "");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));

        env::set_var("JWT_SECRET", "too-short");
        assert!(matches!(Config::from_env(), Err(ConfigError::WeakSecret(_))));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_secret_not_in_debug_output() {
        setup_minimal_config();

        let config = Config::from_env().unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("test-jwt-secret-must-be-at-least-32-characters-long"));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_overrides_and_invalid_values() {
        setup_minimal_config();
        env::set_var("JWT_EXPIRY_HOURS", "2");
        env::set_var("PASSWORD_HASH_COST", "4");
        env::set_var("ENABLE_SIGNUP", "false");
        env::set_var("LOG_FORMAT", "json");

        let config = Config::from_env().unwrap();
        assert_eq!(config.token_ttl(), Duration::hours(2));
        assert_eq!(config.password_hash_cost, 4);
        assert!(!config.enable_signup);
        assert_eq!(config.log_format, LogFormat::Json);

        env::set_var("PASSWORD_HASH_COST", "0");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));
        env::set_var("PASSWORD_HASH_COST", "32");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));
        env::set_var("PASSWORD_HASH_COST", "12");

        env::set_var("JWT_EXPIRY_HOURS", "0");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));
        env::set_var("JWT_EXPIRY_HOURS", "a day");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));
        env::set_var("JWT_EXPIRY_HOURS", "8760");
        assert_eq!(Config::from_env().unwrap().token_ttl(), Duration::hours(8760));
        let max = i64::MAX.to_string();
        for oversized in ["8761", "100000000", max.as_str()] {
            env::set_var("JWT_EXPIRY_HOURS", oversized);
            assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));
        }
        env::set_var("JWT_EXPIRY_HOURS", "24");

        env::set_var("LOG_FORMAT", "xml");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));

        cleanup_config();
    }
}
