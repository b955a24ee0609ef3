use serde::Deserialize;
use std::env;
use yatra_booking::policy::{DEFAULT_CANCELLATION_WINDOW_MINUTES, DEFAULT_MAX_SEATS_PER_BOOKING};
use yatra_booking::BookingPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Rate limiting is off when absent
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_cancellation_window")]
    pub cancellation_window_minutes: i64,
    #[serde(default = "default_max_seats")]
    pub max_seats_per_booking: i32,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

fn default_cancellation_window() -> i64 { DEFAULT_CANCELLATION_WINDOW_MINUTES }
fn default_max_seats() -> i32 { DEFAULT_MAX_SEATS_PER_BOOKING }
fn default_rate_limit() -> u32 { 100 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            cancellation_window_minutes: default_cancellation_window(),
            max_seats_per_booking: default_max_seats(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

impl BusinessRules {
    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy::new(self.cancellation_window_minutes, self.max_seats_per_booking)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `YATRA__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("YATRA").prefix_separator("__").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rules_defaults() {
        let rules: BusinessRules = serde_json::from_str("{}").unwrap();
        assert_eq!(rules.cancellation_window_minutes, 120);
        assert_eq!(rules.max_seats_per_booking, 10);
        assert_eq!(rules.rate_limit_per_minute, 100);
        assert_eq!(rules.booking_policy(), BookingPolicy::default());
    }

    #[test]
    fn test_redis_section_is_optional() {
        let raw = r#"{
            "server": {"port": 3000},
            "database": {"url": "postgres://localhost/yatra"},
            "auth": {"jwt_secret": "s3cret", "jwt_expiration_seconds": 3600}
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert!(config.redis.is_none());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.business_rules.max_seats_per_booking, 10);
    }
}
