use std::{io, time::Duration};

use common::ConfigError;
use thiserror::Error;

use crate::acl::AclError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Acl(#[from] AclError),

    #[error("cannot install logging: {0}")]
    Logging(String),

    #[error("cannot provide tracing: {0}")]
    Telemetry(String),

    #[error("server failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to gracefully shutdown the server within {0:?}")]
    ShutdownTimeout(Duration),
}

pub type ServerResult<T> = Result<T, ServerError>;
