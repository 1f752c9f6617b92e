//! HTTP client with status classification

use crate::error::{Error, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Name used in error titles and logs
    pub service: String,
    /// Base URL for relative paths
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            service: "Service".to_string(),
            base_url: None,
            timeout: Duration::from_secs(10),
            default_headers: HashMap::new(),
            user_agent: format!("selfnet-nbi/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the backend name
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.config.service = service.into();
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Request payload
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    /// Raw text with an explicit content type
    Text { content_type: String, body: String },
    /// A single multipart file field
    File {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, sent in order
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
    pub body: Option<RequestBody>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Return the response whatever its status
    pub ignore_status: bool,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add many query parameters, keeping their order
    #[must_use]
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Set a raw text body
    #[must_use]
    pub fn text(mut self, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text {
            content_type: content_type.into(),
            body: body.into(),
        });
        self
    }

    /// Upload one file as multipart form data
    #[must_use]
    pub fn file(mut self, field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.body = Some(RequestBody::File {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Treat any status as success
    #[must_use]
    pub fn ignore_status(mut self) -> Self {
        self.ignore_status = true;
        self
    }
}

/// HTTP client for one backend
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::GET, url, config).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::POST, url, config).await
    }

    /// Make a PATCH request
    pub async fn patch(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::PATCH, url, config).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::PUT, url, config).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::DELETE, url, config).await
    }

    /// Make a request that never fails on status
    pub async fn probe(&self, method: Method, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(method, url, config.ignore_status()).await
    }

    /// Make a generic request, attempted once
    pub async fn request(&self, method: Method, url: &str, config: RequestConfig) -> Result<Response> {
        let full_url = self.build_url(url);
        let service = &self.config.service;
        debug!(%method, service, endpoint = %full_url, "requesting backend");

        let mut req = self
            .client
            .request(method.clone(), &full_url)
            .timeout(config.timeout.unwrap_or(self.config.timeout));

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !config.query.is_empty() {
            req = req.query(&config.query);
        }

        req = match config.body {
            Some(RequestBody::Json(body)) => req.json(&body),
            Some(RequestBody::Text { content_type, body }) => req
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(body),
            Some(RequestBody::File {
                field,
                file_name,
                bytes,
            }) => {
                let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                req.multipart(reqwest::multipart::Form::new().part(field, part))
            }
            None => req,
        };

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                error!(service, endpoint = %full_url, "backend timeout");
                return Err(Error::Timeout {
                    service: service.clone(),
                });
            }
            Err(e) if e.is_connect() => {
                error!(service, endpoint = %full_url, error = %e, "backend connection error");
                return Err(Error::Connection {
                    service: service.clone(),
                });
            }
            Err(e) => return Err(Error::Http(e)),
        };

        if config.ignore_status {
            return Ok(response);
        }
        self.classify(response).await
    }

    /// Map backend statuses onto gateway errors
    async fn classify(&self, response: Response) -> Result<Response> {
        let status = response.status();
        let service = &self.config.service;

        match status {
            StatusCode::UNAUTHORIZED => Err(Error::unauthorized("Please validate your authentication")),
            StatusCode::NOT_FOUND => Err(Error::not_found(format!("{service} resource"))),
            StatusCode::INTERNAL_SERVER_ERROR => Err(Error::BackendFailure {
                service: service.clone(),
            }),
            s if s.as_u16() > 299 => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::backend_status(service.clone(), s.as_u16(), body))
            }
            _ => Ok(response),
        }
    }

    /// Response body as JSON; an empty body reads as `null`
    pub async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let text = response.text().await?;
        debug!(service = %self.config.service, body = %text, "backend response");
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }

    /// Make a request and parse JSON response
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let response = self.request(method, url, config).await?;
        self.read_json(response).await
    }

    /// Make a GET request and parse JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, config: RequestConfig) -> Result<T> {
        self.request_json(Method::GET, url, config).await
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                if path.is_empty() {
                    base.to_string()
                } else {
                    format!("{base}/{path}")
                }
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
