//! Server configuration.

use std::time::Duration;

use common::{ConfigError, EnvReader, FromEnv};

use crate::{
    acl::AclConfig, logging::LoggingConfig, middleware::recover::RecoverConfig,
    middleware::secure::SecureConfig, telemetry::TracingConfig,
};

/// Server configuration with the settings of every middleware.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Service name for logging and tracing
    pub name: String,
    pub host: String,
    pub port: u16,
    pub production: bool,
    pub graceful_shutdown_timeout: Duration,
    pub logging: LoggingConfig,
    pub tracing: TracingConfig,
    pub recover: RecoverConfig,
    pub secure: SecureConfig,
    pub acl: AclConfig,
}

impl FromEnv for ServerConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        Ok(Self {
            name: reader.string_or("NAME", "server"),
            host: reader.required("HOST")?,
            port: reader.required_parse("PORT")?,
            production: reader.bool_or("PRODUCTION", false)?,
            graceful_shutdown_timeout: reader
                .duration_or("GRACEFUL_SHUTDOWN_TIMEOUT", Duration::from_secs(60))?,
            logging: LoggingConfig::from_env_reader(reader)?,
            tracing: TracingConfig::from_env_reader(reader)?,
            recover: RecoverConfig::from_env_reader(reader)?,
            secure: SecureConfig::from_env_reader(reader)?,
            acl: AclConfig::from_env_reader(reader)?,
        })
    }
}

impl ServerConfig {
    /// Defaults for every setting, listening on `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            name: "server".to_string(),
            host: host.into(),
            port,
            production: false,
            graceful_shutdown_timeout: Duration::from_secs(60),
            logging: LoggingConfig::default(),
            tracing: TracingConfig::default(),
            recover: RecoverConfig::default(),
            secure: SecureConfig::default(),
            acl: AclConfig::default(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
