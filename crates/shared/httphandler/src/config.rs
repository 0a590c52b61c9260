use std::time::Duration;

use common::{util::TlsSettings, ConfigError, EnvReader, FromEnv};

/// Client configuration read from `REST_CLIENT_*` variables.
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub tls: TlsSettings,
    /// Sent as one `Cookie` header on every request
    pub cookies: Vec<(String, String)>,
    /// Retries after transport errors
    pub max_retries: u32,
    /// Base delay of the retry back-off
    pub retry_wait: Duration,
}

impl FromEnv for RestClientConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("REST_CLIENT_");

        Ok(Self {
            base_url: env.required("BASE_URL")?,
            timeout: env.duration_or("TIMEOUT", Duration::from_secs(60))?,
            username: env.take_secret("USERNAME"),
            password: env.take_secret("PASSWORD"),
            token: env.take_secret("TOKEN"),
            tls: TlsSettings::from_reader(&env)?,
            cookies: Vec::new(),
            max_retries: env.parse_or("MAX_RETRIES", 0)?,
            retry_wait: env.duration_or("RETRY_WAIT", Duration::from_secs(1))?,
        })
    }
}

impl RestClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(60),
            username: None,
            password: None,
            token: None,
            tls: TlsSettings::default(),
            cookies: Vec::new(),
            max_retries: 0,
            retry_wait: Duration::from_secs(1),
        }
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_defaults() {
        let reader = EnvReader::from_map([("REST_CLIENT_BASE_URL", "http://localhost:9000")]);
        let config = RestClientConfig::from_env_reader(&reader).unwrap();

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 0);
        assert!(!config.tls.secure);
        assert!(config.username.is_none());
    }

    #[test]
    fn base_url_must_not_be_empty() {
        let reader = EnvReader::from_map([("REST_CLIENT_BASE_URL", "")]);

        assert!(matches!(
            RestClientConfig::from_env_reader(&reader),
            Err(ConfigError::Missing(key)) if key == "REST_CLIENT_BASE_URL"
        ));
    }

    #[test]
    fn reads_credentials_and_tls() {
        let reader = EnvReader::from_map([
            ("REST_CLIENT_BASE_URL", "https://api.example.com"),
            ("REST_CLIENT_TIMEOUT", "5s"),
            ("REST_CLIENT_TOKEN", "abc"),
            ("REST_CLIENT_TLS_SECURE", "true"),
            ("REST_CLIENT_TLS_CA", "/etc/ssl/ca.pem"),
            ("REST_CLIENT_MAX_RETRIES", "3"),
        ]);
        let config = RestClientConfig::from_env_reader(&reader).unwrap();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert!(config.tls.secure);
        assert_eq!(config.tls.ca_file.as_deref(), Some("/etc/ssl/ca.pem"));
        assert_eq!(config.max_retries, 3);
    }
}
