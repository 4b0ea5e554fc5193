use std::env;
use std::fmt;

use chrono::Duration;

/// Empirically-chosen engine knobs, constructed by the embedder and injected
/// at startup. The statistical parameter tables live in
/// [`crate::engine::params`]; only values that an operator may want to tune
/// without a release belong here.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Multiplier applied to effective capacity when neither an explicit
    /// waiting position nor snapshot history exists. Preserved as a knob
    /// rather than re-derived; 2.0 matches observed behavior.
    pub fallback_waiting_multiplier: f64,
    /// Nominal capacity for synthesized facility records.
    pub default_capacity: u32,
    /// Maximum drift (in positions) between the cached and requested
    /// self-reported waiting position before a cache entry is rejected.
    pub cache_drift_tolerance: u32,
    /// Time-to-live for cache entries.
    pub cache_ttl: Duration,
    /// Row cap on the snapshot history scan.
    pub snapshot_scan_limit: usize,
    /// How far back the snapshot scan reaches, in months.
    pub snapshot_window_months: u32,
    /// Consecutive vacancy detections closer together than this merge into
    /// one event.
    pub event_timeout_hours: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_waiting_multiplier: 2.0,
            default_capacity: 60,
            cache_drift_tolerance: 2,
            cache_ttl: Duration::hours(24),
            snapshot_scan_limit: 500,
            snapshot_window_months: 12,
            event_timeout_hours: 48.0,
        }
    }
}

impl EngineConfig {
    /// Build a configuration from the process environment, falling back to
    /// the defaults for anything unset.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            fallback_waiting_multiplier: parse_var(
                "ADMISSION_FALLBACK_WAITING_MULTIPLIER",
                defaults.fallback_waiting_multiplier,
            )?,
            default_capacity: parse_var("ADMISSION_DEFAULT_CAPACITY", defaults.default_capacity)?,
            cache_drift_tolerance: parse_var(
                "ADMISSION_CACHE_DRIFT_TOLERANCE",
                defaults.cache_drift_tolerance,
            )?,
            cache_ttl: Duration::hours(parse_var(
                "ADMISSION_CACHE_TTL_HOURS",
                defaults.cache_ttl.num_hours(),
            )?),
            snapshot_scan_limit: parse_var(
                "ADMISSION_SNAPSHOT_SCAN_LIMIT",
                defaults.snapshot_scan_limit,
            )?,
            snapshot_window_months: parse_var(
                "ADMISSION_SNAPSHOT_WINDOW_MONTHS",
                defaults.snapshot_window_months,
            )?,
            event_timeout_hours: parse_var(
                "ADMISSION_EVENT_TIMEOUT_HOURS",
                defaults.event_timeout_hours,
            )?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Tracing controls, mirroring the service-side telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl TelemetryConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        let log_level = env::var("ADMISSION_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        Self { log_level }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} could not be parsed from '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("ADMISSION_FALLBACK_WAITING_MULTIPLIER");
        env::remove_var("ADMISSION_DEFAULT_CAPACITY");
        env::remove_var("ADMISSION_CACHE_DRIFT_TOLERANCE");
        env::remove_var("ADMISSION_CACHE_TTL_HOURS");
        env::remove_var("ADMISSION_SNAPSHOT_SCAN_LIMIT");
        env::remove_var("ADMISSION_SNAPSHOT_WINDOW_MONTHS");
        env::remove_var("ADMISSION_EVENT_TIMEOUT_HOURS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = EngineConfig::load().expect("config loads with defaults");
        assert_eq!(config.fallback_waiting_multiplier, 2.0);
        assert_eq!(config.cache_drift_tolerance, 2);
        assert_eq!(config.cache_ttl, Duration::hours(24));
        assert_eq!(config.snapshot_scan_limit, 500);
    }

    #[test]
    fn load_rejects_unparseable_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADMISSION_CACHE_TTL_HOURS", "one day");
        let err = EngineConfig::load().expect_err("invalid ttl rejected");
        assert!(err.to_string().contains("ADMISSION_CACHE_TTL_HOURS"));
        reset_env();
    }

    #[test]
    fn load_reads_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADMISSION_CACHE_DRIFT_TOLERANCE", "4");
        env::set_var("ADMISSION_DEFAULT_CAPACITY", "90");
        let config = EngineConfig::load().expect("config loads");
        assert_eq!(config.cache_drift_tolerance, 4);
        assert_eq!(config.default_capacity, 90);
        reset_env();
    }
}
