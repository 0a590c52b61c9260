//! The reqwest-backed client.

use common::util::inc_retry_delay;
use opentelemetry::global;
use opentelemetry_http::HeaderInjector;
use reqwest::{
    header::{HeaderMap, AUTHORIZATION, COOKIE},
    Certificate, Client, Identity, Method, RequestBuilder,
};
use serde::de::DeserializeOwned;
use tracing::Level;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::{
    config::RestClientConfig,
    error::{HttpClientError, HttpClientResult},
    request::{HttpRequest, HttpResponse, REQUEST_ID_HEADER},
};

#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: Client,
    config: RestClientConfig,
}

impl HttpHandler {
    pub fn new(config: RestClientConfig) -> HttpClientResult<Self> {
        let mut builder = Client::builder().timeout(config.timeout);

        if let Some(tls) = config.tls.load()? {
            builder = builder
                .identity(Identity::from_pem(&tls.identity_pem).map_err(HttpClientError::Build)?)
                .add_root_certificate(
                    Certificate::from_pem(&tls.ca_pem).map_err(HttpClientError::Build)?,
                );
        }

        let client = builder.build().map_err(HttpClientError::Build)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Send `request`, retrying transport errors with a growing delay.
    pub async fn execute(&self, request: HttpRequest) -> HttpClientResult<HttpResponse> {
        if !is_supported(&request.method) {
            return Err(HttpClientError::InvalidMethod);
        }

        let request_id = request
            .request_id
            .clone()
            .or_else(|| header_value(&request, REQUEST_ID_HEADER))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut attempt = 0;
        let response = loop {
            match self.build(&request, &request_id).send().await {
                Ok(response) => break response,
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = inc_retry_delay(attempt, self.config.retry_wait);
                    tracing::warn!(
                        id = %request_id,
                        attempt,
                        delay = ?delay,
                        error = %e,
                        "Warning while using http client"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(id = %request_id, error = %e, "error while using http client");
                    return Err(e.into());
                }
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            tracing::error!(id = %request_id, error = %e, "error while using http client");
            HttpClientError::Request(e)
        })?;

        if tracing::enabled!(Level::DEBUG) {
            tracing::debug!(
                id = %request_id,
                method = %request.method,
                url = %request.url,
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&body),
                "Debugging while using http client"
            );
        }

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
            forced_content_type: request.force_content_type,
        })
    }

    /// Send `request` and decode a successful JSON response.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: HttpRequest) -> HttpClientResult<T> {
        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(HttpClientError::Status {
                status: response.status,
                body: response.text(),
            });
        }
        response.json()
    }

    fn build(&self, request: &HttpRequest, request_id: &str) -> RequestBuilder {
        let url = self.url_for(&request.resolved_path());
        let mut builder = self.client.request(request.method.clone(), url);

        if let (Some(user), Some(password)) = (&self.config.username, &self.config.password) {
            builder = builder.basic_auth(user, Some(password));
        } else if let Some(token) = &self.config.token {
            builder = builder.bearer_auth(token);
        }

        if !self.config.cookies.is_empty() {
            let cookies = self
                .config
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, cookies);
        }

        for (name, value) in &request.headers {
            if name.eq_ignore_ascii_case(REQUEST_ID_HEADER)
                || (name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) && self.has_credentials())
            {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = builder.header(REQUEST_ID_HEADER, request_id);

        let mut trace_headers = HeaderMap::new();
        let cx = tracing::Span::current().context();
        global::get_text_map_propagator(|propagator| {
            propagator.inject_context(&cx, &mut HeaderInjector(&mut trace_headers))
        });
        if !trace_headers.is_empty() {
            builder = builder.headers(trace_headers);
        }

        let mut query: Vec<(&str, &str)> = request
            .query_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        for (name, values) in &request.multi_query_params {
            query.extend(values.iter().map(|v| (name.as_str(), v.as_str())));
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        } else if !request.form_data.is_empty()
            && (request.method == Method::POST || request.method == Method::PUT)
        {
            builder = builder.form(&request.form_data);
        }

        builder
    }

    fn has_credentials(&self) -> bool {
        (self.config.username.is_some() && self.config.password.is_some())
            || self.config.token.is_some()
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn is_supported(method: &Method) -> bool {
    [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
        Method::PATCH,
    ]
    .contains(method)
}

fn header_value(request: &HttpRequest, name: &str) -> Option<String> {
    request
        .headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
        .filter(|value| !value.is_empty())
}
