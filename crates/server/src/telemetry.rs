//! OpenTelemetry tracing over OTLP/HTTP.

use std::time::Duration;

use common::{ConfigError, EnvReader, FromEnv};
use opentelemetry::{
    global,
    propagation::TextMapCompositePropagator,
    trace::TracerProvider as _,
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::{BaggagePropagator, TraceContextPropagator},
    trace::{BatchConfigBuilder, BatchSpanProcessor, SdkTracerProvider, Tracer},
    Resource,
};

use crate::error::{ServerError, ServerResult};

/// Tracing configuration read from `TRACE_*` variables.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub batch_timeout: Duration,
    pub max_export_batch_size: usize,
    /// Export over plain HTTP instead of HTTPS
    pub http_insecure: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: 0,
            batch_timeout: Duration::from_millis(5000),
            max_export_batch_size: 512,
            http_insecure: false,
        }
    }
}

impl FromEnv for TracingConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("TRACE_");
        let enabled = env.bool_or("ENABLED", false)?;

        let (host, port) = if enabled {
            (env.required("HOST")?, env.required_parse("PORT")?)
        } else {
            (env.string_or("HOST", ""), env.parse_or("PORT", 0)?)
        };

        Ok(Self {
            enabled,
            host,
            port,
            batch_timeout: env.duration_or("BATCH_TIMEOUT", Duration::from_millis(5000))?,
            max_export_batch_size: env.parse_or("MAX_EXPORT_BATCH_SIZE", 512)?,
            http_insecure: env.bool_or("HTTP_INSECURE", false)?,
        })
    }
}

impl TracingConfig {
    /// OTLP/HTTP traces endpoint.
    pub fn endpoint(&self) -> String {
        let scheme = if self.http_insecure { "http" } else { "https" };
        format!("{}://{}:{}/v1/traces", scheme, self.host, self.port)
    }
}

/// Build and register the tracer provider. `None` when tracing is disabled.
///
/// Runs before the subscriber exists, so the caller logs the outcome.
pub fn provide(config: &TracingConfig, service_name: &str) -> ServerResult<Option<SdkTracerProvider>> {
    if !config.enabled {
        return Ok(None);
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(config.endpoint())
        .with_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| ServerError::Telemetry(e.to_string()))?;

    let processor = BatchSpanProcessor::builder(exporter)
        .with_batch_config(
            BatchConfigBuilder::default()
                .with_scheduled_delay(config.batch_timeout)
                .with_max_export_batch_size(config.max_export_batch_size)
                .build(),
        )
        .build();

    let provider = SdkTracerProvider::builder()
        .with_span_processor(processor)
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.to_string())
                .build(),
        )
        .build();

    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    Ok(Some(provider))
}

/// Tracer for the OpenTelemetry logging layer.
pub fn tracer(provider: &SdkTracerProvider, service_name: &str) -> Tracer {
    provider.tracer(service_name.to_string())
}

/// Flush pending spans and stop the exporter.
pub fn shutdown(provider: SdkTracerProvider) {
    if let Err(e) = provider.force_flush() {
        tracing::error!(error = %e, "error while flushing the tracer provider");
    }
    if let Err(e) = provider.shutdown() {
        tracing::error!(error = %e, "error while shutting down the tracer provider");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracing_needs_no_endpoint() {
        let config = TracingConfig::from_env_reader(&EnvReader::from_map(Vec::<(String, String)>::new())).unwrap();

        assert!(!config.enabled);
        assert_eq!(config.batch_timeout, Duration::from_millis(5000));
        assert_eq!(config.max_export_batch_size, 512);
        assert!(provide(&config, "test").unwrap().is_none());
    }

    #[test]
    fn enabled_tracing_requires_host_and_port() {
        let reader = EnvReader::from_map([("TRACE_ENABLED", "true"), ("TRACE_HOST", "otel")]);

        assert!(matches!(
            TracingConfig::from_env_reader(&reader),
            Err(ConfigError::Missing(key)) if key == "TRACE_PORT"
        ));
    }

    #[test]
    fn builds_endpoint_by_scheme() {
        let reader = EnvReader::from_map([
            ("TRACE_ENABLED", "true"),
            ("TRACE_HOST", "otel"),
            ("TRACE_PORT", "4318"),
            ("TRACE_HTTP_INSECURE", "true"),
        ]);
        let mut config = TracingConfig::from_env_reader(&reader).unwrap();

        assert_eq!(config.endpoint(), "http://otel:4318/v1/traces");
        config.http_insecure = false;
        assert_eq!(config.endpoint(), "https://otel:4318/v1/traces");
    }
}
