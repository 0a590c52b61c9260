use common::ConfigError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("invalid method type to create http request")]
    InvalidMethod,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot build http client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response status {status}")]
    Status { status: StatusCode, body: String },

    #[error("cannot decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request parameters must be a struct")]
    NotAStruct,
}

pub type HttpClientResult<T> = Result<T, HttpClientError>;
