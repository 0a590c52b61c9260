//! Common utilities shared across all services.
//!
//! This crate provides:
//! - Unified error handling with a configurable error-to-status map
//! - Environment-based configuration loading
//! - Retry back-off, TLS material and URL encoding helpers

pub mod config;
pub mod error;
pub mod util;

pub use config::{load, load_env_files, ConfigError, EnvReader, FromEnv};
pub use error::{AppError, AppResult, ErrorDetail, ErrorStatusMap, OptionExt};
