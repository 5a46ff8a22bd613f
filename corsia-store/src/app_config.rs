use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub reservation: ReservationRules,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub audit: AuditSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

/// Retry behavior of the reservation engine. Only revision conflicts are
/// retried; the defaults bound worst-case latency at roughly 700ms.
#[derive(Debug, Deserialize, Clone)]
pub struct ReservationRules {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditSettings {
    #[serde(default = "default_audit_topic")]
    pub topic: String,
    #[serde(default = "default_audit_buffer")]
    pub buffer_size: usize,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    100
}
fn default_backoff_multiplier() -> u32 {
    2
}
fn default_cache_capacity() -> usize {
    1024
}
fn default_cache_ttl_seconds() -> u64 {
    30
}
fn default_audit_topic() -> String {
    "reservations.audit".to_string()
}
fn default_audit_buffer() -> usize {
    1024
}

impl ReservationRules {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for ReservationRules {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            topic: default_audit_topic(),
            buffer_size: default_audit_buffer(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of CORSIA)
            // Eg.. `CORSIA__DATABASE__URL=...` would set `database.url`
            .add_source(config::Environment::with_prefix("CORSIA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
