//! Environment-based configuration loading.
//!
//! Config structs implement [`FromEnv`] on top of an [`EnvReader`]. Local env
//! files are loaded first with `dotenvy`, so values in them become regular
//! process environment variables.

use std::{
    collections::HashMap,
    env,
    io,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use thiserror::Error;

/// Env files loaded by [`load_env_files`], in order.
pub const ENV_FILES: [&str; 2] = [".env.secrets.local", ".env.local"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable \"{0}\" is not set")]
    Missing(String),

    #[error("invalid value \"{value}\" for environment variable \"{key}\": {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("cannot load env file {file}: {source}")]
    EnvFile {
        file: String,
        #[source]
        source: dotenvy::Error,
    },

    #[error("cannot read file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot provide {0}")]
    Unsupported(String),
}

impl ConfigError {
    pub fn invalid(key: &str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Load the local env files from the working directory.
///
/// Returns the names of the files that were loaded.
pub fn load_env_files() -> Result<Vec<String>, ConfigError> {
    load_env_files_from(Path::new("."))
}

/// Load the local env files from `dir`. Missing files are skipped.
pub fn load_env_files_from(dir: &Path) -> Result<Vec<String>, ConfigError> {
    let mut loaded = Vec::new();

    for file in ENV_FILES {
        let path: PathBuf = dir.join(file);
        match dotenvy::from_path(&path) {
            Ok(()) => loaded.push(file.to_string()),
            Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ConfigError::EnvFile {
                    file: file.to_string(),
                    source,
                })
            }
        }
    }

    Ok(loaded)
}

/// Load the env files, then build `T` from the environment.
pub fn load<T: FromEnv>() -> Result<(T, Vec<String>), ConfigError> {
    let files = load_env_files()?;
    let config = T::from_env()?;
    Ok((config, files))
}

/// A config struct that can be read from environment variables.
pub trait FromEnv: Sized {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError>;

    fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_reader(&EnvReader::new())
    }
}

#[derive(Debug, Clone)]
enum Source {
    Process,
    Map(HashMap<String, String>),
}

/// Typed access to environment variables.
///
/// Empty values count as unset.
#[derive(Debug, Clone)]
pub struct EnvReader {
    prefix: String,
    source: Source,
}

impl Default for EnvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvReader {
    /// Reader over the process environment.
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            source: Source::Process,
        }
    }

    /// Reader over a fixed set of variables.
    pub fn from_map<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: String::new(),
            source: Source::Map(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Same source, with `prefix` prepended to every key.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            prefix: format!("{}{}", self.prefix, prefix),
            source: self.source.clone(),
        }
    }

    /// Full name of `key` with the prefix applied.
    pub fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        let full = self.key(key);
        let value = match &self.source {
            Source::Process => env::var(&full).ok(),
            Source::Map(vars) => vars.get(&full).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.string(key)
            .ok_or_else(|| ConfigError::Missing(self.key(key)))
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.string(key) {
            None => Ok(default),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "t" | "true" | "yes" | "y" | "on" => Ok(true),
                "0" | "f" | "false" | "no" | "n" | "off" => Ok(false),
                _ => Err(ConfigError::invalid(&self.key(key), &value, "not a boolean")),
            },
        }
    }

    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(key)
            .map(|value| {
                value
                    .trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::invalid(&self.key(key), &value, e))
            })
            .transpose()
    }

    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse(key)?.unwrap_or(default))
    }

    pub fn required_parse<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.parse(key)?
            .ok_or_else(|| ConfigError::Missing(self.key(key)))
    }

    /// Comma-separated list; items are trimmed and empty items dropped.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.string(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn list_or(&self, key: &str, default: &[&str]) -> Vec<String> {
        let list = self.list(key);
        if list.is_empty() {
            default.iter().map(|s| s.to_string()).collect()
        } else {
            list
        }
    }

    pub fn duration_or(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        match self.string(key) {
            None => Ok(default),
            Some(value) => parse_duration(&value)
                .map_err(|reason| ConfigError::invalid(&self.key(key), &value, reason)),
        }
    }

    /// Read a secret and remove it from the process environment.
    pub fn take_secret(&self, key: &str) -> Option<String> {
        let value = self.string(key);
        if let Source::Process = self.source {
            env::remove_var(self.key(key));
        }
        value
    }
}

/// Parse a duration such as `300ms`, `1.5h` or `2h45m`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if s.starts_with('-') {
        return Err("negative duration".to_string());
    }

    let mut rest = s.strip_prefix('+').unwrap_or(s);
    let mut total = 0f64;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration {input:?}"))?;
        if number_end == 0 {
            return Err(format!("invalid duration {input:?}"));
        }
        let number: f64 = rest[..number_end]
            .parse()
            .map_err(|_| format!("invalid duration {input:?}"))?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_end] {
            "ns" => 1e0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            unit => return Err(format!("unknown unit {unit:?} in duration {input:?}")),
        };
        rest = &rest[unit_end..];

        total += number * nanos_per_unit;
    }

    Ok(Duration::from_nanos(total.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn reads_with_prefix() {
        let reader = EnvReader::from_map([("POSTGRES_HOST", "db"), ("POSTGRES_PORT", "5432")])
            .with_prefix("POSTGRES_");

        assert_eq!(reader.required("HOST").unwrap(), "db");
        assert_eq!(reader.parse_or::<u16>("PORT", 0).unwrap(), 5432);
        assert_eq!(reader.string_or("SSL_MODE", "disable"), "disable");
    }

    #[test]
    fn missing_required_names_full_key() {
        let reader = EnvReader::from_map([("POSTGRES_HOST", "")]).with_prefix("POSTGRES_");

        let err = reader.required("HOST").unwrap_err();
        assert_eq!(
            err.to_string(),
            "required environment variable \"POSTGRES_HOST\" is not set"
        );
    }

    #[test]
    fn parses_bools_and_rejects_garbage() {
        let reader = EnvReader::from_map([("A", "true"), ("B", "0"), ("C", "maybe")]);

        assert!(reader.bool_or("A", false).unwrap());
        assert!(!reader.bool_or("B", true).unwrap());
        assert!(reader.bool_or("MISSING", true).unwrap());
        assert!(matches!(
            reader.bool_or("C", false),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn lists_are_trimmed() {
        let reader = EnvReader::from_map([("METHODS", " GET, POST ,,PUT ")]);

        assert_eq!(reader.list("METHODS"), vec!["GET", "POST", "PUT"]);
        assert_eq!(reader.list_or("HEADERS", &["*"]), vec!["*"]);
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("60s").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("3m").unwrap(), Duration::from_secs(180));
        assert_eq!(parse_duration("5000ms").unwrap(), Duration::from_millis(5000));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("250µs").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn duration_or_reports_key() {
        let reader = EnvReader::from_map([("SERVER_TIMEOUT", "soon")]).with_prefix("SERVER_");

        let err = reader.duration_or("TIMEOUT", Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("SERVER_TIMEOUT"));
        assert_eq!(
            reader
                .duration_or("IDLE", Duration::from_secs(60))
                .unwrap(),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn loads_existing_env_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".env.local"),
            "COMMON_CONFIG_TEST_LOCAL=from-local\n",
        )
        .unwrap();

        let loaded = load_env_files_from(dir.path()).unwrap();

        assert_eq!(loaded, vec![".env.local".to_string()]);
        assert_eq!(
            env::var("COMMON_CONFIG_TEST_LOCAL").unwrap(),
            "from-local"
        );
    }

    #[test]
    fn secrets_file_wins_over_local() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".env.secrets.local"),
            "COMMON_CONFIG_TEST_SECRET=secret\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(".env.local"),
            "COMMON_CONFIG_TEST_SECRET=local\n",
        )
        .unwrap();

        let loaded = load_env_files_from(dir.path()).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(env::var("COMMON_CONFIG_TEST_SECRET").unwrap(), "secret");
    }

    #[test]
    fn take_secret_removes_variable() {
        env::set_var("COMMON_CONFIG_TEST_TOKEN", "s3cr3t");

        let reader = EnvReader::new().with_prefix("COMMON_CONFIG_TEST_");
        assert_eq!(reader.take_secret("TOKEN").as_deref(), Some("s3cr3t"));
        assert!(env::var("COMMON_CONFIG_TEST_TOKEN").is_err());
    }

    struct Sample {
        host: String,
        port: u16,
    }

    impl FromEnv for Sample {
        fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
            Ok(Self {
                host: reader.required("HOST")?,
                port: reader.required_parse("PORT")?,
            })
        }
    }

    #[test]
    fn from_env_reader_builds_struct() {
        let reader = EnvReader::from_map([("HOST", "localhost"), ("PORT", "8080")]);
        let sample = Sample::from_env_reader(&reader).unwrap();

        assert_eq!(sample.host, "localhost");
        assert_eq!(sample.port, 8080);

        let reader = EnvReader::from_map([("HOST", "localhost"), ("PORT", "http")]);
        assert!(Sample::from_env_reader(&reader).is_err());
    }
}
