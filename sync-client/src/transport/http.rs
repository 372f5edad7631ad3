//! HTTPS transport for the room listing service.
//!
//! Every request is issued against `{base_url}/scene/apps/{app_id}` with the
//! configured headers (typically region and authorization) attached.

use super::{Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use roomsync_types::{ApiRequest, ApiResponse};
use std::collections::BTreeMap;
use std::time::Duration;

/// Longest body excerpt kept in [`TransportError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Service origin, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Application identifier inserted into the path prefix.
    pub app_id: String,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpTransportConfig {
    /// Create a config with no extra headers and a 30 second timeout.
    pub fn new(base_url: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            app_id: app_id.into(),
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Transport backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    prefix: String,
}

impl HttpTransport {
    /// Build the transport, validating headers and the base URL.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidConfig(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidConfig(format!("header {name}: {e}")))?;
            headers.insert(header, value);
        }

        let prefix = format!(
            "{}/scene/apps/{}",
            config.base_url.trim_end_matches('/'),
            config.app_id
        );
        Url::parse(&prefix)
            .map_err(|e| TransportError::InvalidConfig(format!("base url: {e}")))?;

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, prefix })
    }

    /// Resolve a request into its absolute URL.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = Url::parse(&format!("{}{}", self.prefix, request.path))
            .map_err(|e| TransportError::InvalidConfig(format!("request path: {e}")))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }
        Ok(url)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::ConnectionFailed(e.to_string())
        } else {
            TransportError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(request)?;
        tracing::trace!(%url, "GET");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let mut text = String::from_utf8_lossy(&body).into_owned();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        ApiResponse::from_slice(&body).map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}
