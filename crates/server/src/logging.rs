//! Structured logging with `tracing-subscriber`.

use common::{ConfigError, EnvReader, FromEnv};
use opentelemetry_sdk::trace::Tracer;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{ServerError, ServerResult};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub as_json: bool,
    /// Paths excluded from the body dump
    pub skip_body_dump_urls: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            as_json: false,
            skip_body_dump_urls: Vec::new(),
        }
    }
}

impl FromEnv for LoggingConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let level = match reader.string("LOG_LEVEL") {
            None => Level::INFO,
            Some(value) => parse_level(&value)?,
        };

        Ok(Self {
            level,
            as_json: reader.bool_or("LOG_AS_JSON", false)?,
            skip_body_dump_urls: reader.list("LOG_SKIP_BODY_DUMP_URLS"),
        })
    }
}

fn parse_level(value: &str) -> Result<Level, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(ConfigError::Unsupported(value.to_string())),
    }
}

/// Install the global subscriber, with an OpenTelemetry layer when a tracer
/// is given. `RUST_LOG` refines the configured level.
pub fn provide(config: &LoggingConfig, tracer: Option<Tracer>) -> ServerResult<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    let fmt_layer = if config.as_json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let otel_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| ServerError::Logging(e.to_string()))
}

/// Whether debug events are currently recorded.
pub fn debug_enabled() -> bool {
    tracing::enabled!(Level::DEBUG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("warn").unwrap(), Level::WARN);
    }

    #[test]
    fn rejects_unknown_level() {
        let reader = EnvReader::from_map([("LOG_LEVEL", "verbose")]);
        let err = LoggingConfig::from_env_reader(&reader).unwrap_err();

        assert_eq!(err.to_string(), "cannot provide verbose");
    }

    #[test]
    fn reads_skip_urls() {
        let reader = EnvReader::from_map([
            ("LOG_AS_JSON", "true"),
            ("LOG_SKIP_BODY_DUMP_URLS", "/health, /metrics"),
        ]);
        let config = LoggingConfig::from_env_reader(&reader).unwrap();

        assert_eq!(config.level, Level::INFO);
        assert!(config.as_json);
        assert_eq!(config.skip_body_dump_urls, vec!["/health", "/metrics"]);
    }
}
