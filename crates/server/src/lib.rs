//! HTTP server toolkit.
//!
//! This crate provides an axum server with request ids, request logging,
//! panic recovery, security layers and ACL enforcement, plus structured
//! logging, OTLP tracing and request validation.

pub mod acl;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod telemetry;
pub mod validation;

pub use acl::{Acl, AclConfig, AclError, Permission};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use extractors::{ValidatedJson, ValidatedQuery};
pub use logging::LoggingConfig;
pub use middleware::{CsrfToken, CurrentUser, RequestId};
pub use server::Server;
pub use telemetry::TracingConfig;
pub use validation::{depends_on, depends_one_of};
