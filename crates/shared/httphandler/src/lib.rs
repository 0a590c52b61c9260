//! Outbound HTTP client wrapper around `reqwest`.
//!
//! [`HttpHandler`] is built once from a [`RestClientConfig`] and then cheaply
//! cloned; `reqwest::Client` is reference counted internally.

mod client;
mod config;
mod error;
mod params;
mod request;

pub use client::HttpHandler;
pub use config::RestClientConfig;
pub use error::{HttpClientError, HttpClientResult};
pub use params::{to_multi_params, to_params};
pub use request::{HttpRequest, HttpResponse, REQUEST_ID_HEADER};

pub use reqwest::{Method, StatusCode};
