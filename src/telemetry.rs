use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("log filter '{value}' from ADMISSION_LOG_LEVEL did not parse")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("failed to install the tracing subscriber")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Install the global tracing subscriber. An explicit `RUST_LOG` wins;
/// otherwise the configured `ADMISSION_LOG_LEVEL` applies.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::Filter {
                value: config.log_level.clone(),
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Install)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_accepts_a_plain_level() {
        let config = TelemetryConfig {
            log_level: "debug".to_string(),
        };
        // A second init in the same process reports Install; both outcomes
        // prove the configured filter parsed.
        match init(&config) {
            Ok(()) | Err(TelemetryError::Install(_)) => {}
            Err(other) => panic!("unexpected telemetry error: {other}"),
        }
    }

    #[test]
    fn filter_errors_name_the_offending_value() {
        let err = TelemetryError::Filter {
            value: "foo=bar=baz".to_string(),
            source: EnvFilter::try_new("foo=bar=baz").expect_err("malformed directive"),
        };
        assert!(err.to_string().contains("foo=bar=baz"));
        assert!(err.to_string().contains("ADMISSION_LOG_LEVEL"));
    }
}
