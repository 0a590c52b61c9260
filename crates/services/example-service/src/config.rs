//! Example service configuration.

use common::{ConfigError, EnvReader, FromEnv};
use database::PostgresConfig;
use httphandler::RestClientConfig;
use server::ServerConfig;

/// Settings of the server, the database and the example check client.
#[derive(Debug, Clone)]
pub struct ExampleConfig {
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    /// Read from `EXAMPLE_SERVICE_REST_CLIENT_*`
    pub client: RestClientConfig,
}

impl FromEnv for ExampleConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env_reader(reader)?,
            postgres: PostgresConfig::from_env_reader(reader)?,
            client: RestClientConfig::from_env_reader(&reader.with_prefix("EXAMPLE_SERVICE_"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("POSTGRES_HOST", "localhost"),
            ("POSTGRES_PORT", "5432"),
            ("POSTGRES_DATABASE", "examples"),
            ("EXAMPLE_SERVICE_REST_CLIENT_BASE_URL", "http://checker:9000"),
        ]
    }

    #[test]
    fn reads_all_sections() {
        let config = ExampleConfig::from_env_reader(&EnvReader::from_map(vars())).unwrap();

        assert_eq!(config.server.address(), "127.0.0.1:8080");
        assert_eq!(config.postgres.database, "examples");
        assert_eq!(config.client.base_url, "http://checker:9000");
    }

    #[test]
    fn client_base_url_is_required() {
        let vars = vars()
            .into_iter()
            .filter(|(key, _)| !key.starts_with("EXAMPLE_SERVICE_"));
        let err = ExampleConfig::from_env_reader(&EnvReader::from_map(vars)).unwrap_err();

        assert!(matches!(err, ConfigError::Missing(key) if key == "EXAMPLE_SERVICE_REST_CLIENT_BASE_URL"));
    }
}
