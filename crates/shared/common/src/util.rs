//! Retry back-off, TLS material and URL encoding helpers.

use std::{fs, path::Path, time::Duration};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::{ConfigError, EnvReader};

/// Everything but the RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode `value` for use as a single URL path segment, userinfo
/// part or query value.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Delay before retry number `attempt`, growing like Fibonacci.
///
/// Attempts 0 and 1 wait `base`, then `2b, 3b, 5b, 8b, ...`.
pub fn inc_retry_delay(attempt: u32, base: Duration) -> Duration {
    let (mut prev, mut curr) = (base, base);
    for _ in 1..attempt {
        let next = prev.saturating_add(curr);
        prev = curr;
        curr = next;
    }
    curr
}

/// Where to find client TLS material.
#[derive(Debug, Clone, Default)]
pub struct TlsSettings {
    pub secure: bool,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub ca_file: Option<String>,
}

/// PEM material read from [`TlsSettings`].
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    /// Certificate chain followed by the private key.
    pub identity_pem: Vec<u8>,
    /// Root certificate of the peer.
    pub ca_pem: Vec<u8>,
}

impl TlsSettings {
    /// Reads `TLS_SECURE`, `TLS_CERT`, `TLS_KEY` and `TLS_CA`.
    pub fn from_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        Ok(Self {
            secure: reader.bool_or("TLS_SECURE", false)?,
            cert_file: reader.string("TLS_CERT"),
            key_file: reader.string("TLS_KEY"),
            ca_file: reader.string("TLS_CA"),
        })
    }

    /// Read the mutual TLS files. `None` when TLS is off; otherwise the
    /// certificate, key and CA are all required.
    pub fn load(&self) -> Result<Option<TlsMaterial>, ConfigError> {
        if !self.secure {
            return Ok(None);
        }

        let cert = required(&self.cert_file, "TLS_CERT")?;
        let key = required(&self.key_file, "TLS_KEY")?;
        let ca = required(&self.ca_file, "TLS_CA")?;

        let mut identity_pem = read(cert)?;
        identity_pem.push(b'\n');
        identity_pem.extend(read(key)?);

        Ok(Some(TlsMaterial {
            identity_pem,
            ca_pem: read(ca)?,
        }))
    }
}

fn required<'a>(file: &'a Option<String>, key: &str) -> Result<&'a str, ConfigError> {
    file.as_deref()
        .filter(|path| !path.is_empty())
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn read(path: &str) -> Result<Vec<u8>, ConfigError> {
    fs::read(Path::new(path)).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })
}
