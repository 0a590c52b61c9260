use std::collections::HashMap;

use common::util::encode_component;
use reqwest::{header::HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HttpClientResult;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// An outbound request relative to the configured base URL.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the base URL, or an absolute URL
    pub url: String,
    /// Content type used for the response instead of the one sent back
    pub force_content_type: Option<String>,
    pub headers: HashMap<String, String>,
    /// Values for `{name}` placeholders in `url`
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub multi_query_params: HashMap<String, Vec<String>>,
    /// Sent as url-encoded form for POST and PUT
    pub form_data: HashMap<String, String>,
    pub body: Option<Value>,
    pub request_id: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, params: HashMap<String, String>) -> Self {
        self.query_params.extend(params);
        self
    }

    pub fn multi_query(mut self, params: HashMap<String, Vec<String>>) -> Self {
        self.multi_query_params.extend(params);
        self
    }

    pub fn form(mut self, data: HashMap<String, String>) -> Self {
        self.form_data.extend(data);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn force_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.force_content_type = Some(content_type.into());
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// `url` with every `{name}` placeholder replaced by its escaped value.
    pub(crate) fn resolved_path(&self) -> String {
        self.path_params
            .iter()
            .fold(self.url.clone(), |url, (name, value)| {
                url.replace(&format!("{{{name}}}"), &encode_component(value))
            })
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub(crate) forced_content_type: Option<String>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Forced content type, else the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.forced_content_type.as_deref().or_else(|| {
            self.headers
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> HttpClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_path_params() {
        let request = HttpRequest::get("/users/{id}/files/{name}")
            .path_param("id", "42")
            .path_param("name", "a b/c.txt");

        assert_eq!(request.resolved_path(), "/users/42/files/a%20b%2Fc.txt");
    }

    #[test]
    fn forced_content_type_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            "text/plain".parse().unwrap(),
        );
        let mut response = HttpResponse {
            status: StatusCode::OK,
            headers,
            body: br#"{"ok":true}"#.to_vec(),
            forced_content_type: None,
        };
        assert_eq!(response.content_type(), Some("text/plain"));

        response.forced_content_type = Some("application/json".to_string());
        assert_eq!(response.content_type(), Some("application/json"));

        let value: Value = response.json().unwrap();
        assert_eq!(value["ok"], true);
    }
}
