use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::EnvFilter;

/// Directives appended unless the configured filter already mentions the crate.
/// Catalog fetches go through reqwest/hyper, which are chatty at `debug`.
const QUIET_DEPENDENCIES: [&str; 2] = ["hyper=warn", "reqwest=warn"];

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "APP_LOG_LEVEL '{value}' is not a valid tracing filter")
            }
            TelemetryError::Subscriber(err) => {
                write!(f, "failed to install the log subscriber: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Filter built from `RUST_LOG` when set, otherwise from the configured level.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let invalid = |source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        source,
    };
    let mut filter = EnvFilter::try_new(&config.log_level).map_err(invalid)?;
    for quiet in QUIET_DEPENDENCIES {
        let target = quiet.split('=').next().unwrap_or(quiet);
        if !config.log_level.contains(target) {
            let directive: Directive = quiet.parse().map_err(invalid)?;
            filter = filter.add_directive(directive);
        }
    }
    Ok(filter)
}

/// Install the global fmt subscriber.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
        }
    }

    #[test]
    fn invalid_filter_is_reported_with_its_value() {
        std::env::remove_var("RUST_LOG");
        let config = config("appointment_intake=verbose");

        match init(&config) {
            Err(TelemetryError::EnvFilter { value, .. }) => assert_eq!(value, config.log_level),
            other => panic!("expected env filter error, got {other:?}"),
        }
    }

    #[test]
    fn http_client_noise_is_quieted_by_default() {
        std::env::remove_var("RUST_LOG");

        let rendered = build_filter(&config("debug")).expect("filter builds").to_string();

        assert!(rendered.contains("hyper=warn"));
        assert!(rendered.contains("reqwest=warn"));
    }

    #[test]
    fn explicit_dependency_levels_are_kept() {
        std::env::remove_var("RUST_LOG");

        let rendered = build_filter(&config("info,reqwest=trace"))
            .expect("filter builds")
            .to_string();

        assert!(rendered.contains("reqwest=trace"));
        assert!(!rendered.contains("reqwest=warn"));
        assert!(rendered.contains("hyper=warn"));
    }
}
