//! HTTP transport over reqwest.
//!
//! Every call is issued against `{api_base}/bot{api_key}/{endpoint}`. GET
//! parameters travel as the query string, POST parameters as a JSON body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode, Url};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use telebot_core::{ApiRequest, ApiResponse, Method, Transport};

use crate::DEFAULT_API_BASE;
use crate::error::{TransportError, TransportResult};

/// Settings for [`HttpTransport`].
#[derive(Clone)]
pub struct HttpTransportConfig {
    /// Scheme and host of the Bot API server.
    pub api_base: String,
    /// Bot credential, embedded in every request path.
    pub api_key: String,
    /// Timeout for ordinary calls. Long-poll calls add their hold time on top.
    pub timeout: Duration,
}

impl HttpTransportConfig {
    /// Creates a config for `api_key` against the public API with a 60s timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the API base URL.
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`Transport`] that talks to the Bot API over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Creates a transport with its own connection pool.
    pub fn new(config: HttpTransportConfig) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a transport sharing an existing reqwest client.
    pub fn with_client(client: Client, config: HttpTransportConfig) -> Self {
        Self { client, config }
    }

    /// The settings this transport was built with.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.api_key,
            endpoint
        )
    }

    async fn execute(&self, request: &ApiRequest) -> TransportResult<ApiResponse<Value>> {
        let url = self.endpoint_url(&request.endpoint);
        let params = request.params.as_ref().map(without_nulls).unwrap_or_default();
        let timeout = self.config.timeout + request.long_poll.unwrap_or_default();

        let builder = match request.method {
            Method::Get => {
                let pairs = query_pairs(&params);
                let url = if pairs.is_empty() {
                    Url::parse(&url)
                } else {
                    Url::parse_with_params(&url, &pairs)
                }
                .map_err(|e| TransportError::Build(e.to_string()))?;
                self.client.get(url)
            }
            Method::Post => {
                let url = Url::parse(&url).map_err(|e| TransportError::Build(e.to_string()))?;
                self.client.post(url).json(&Value::Object(params))
            }
        };

        let response = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(request_error)?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, request: ApiRequest) -> ApiResponse<Value> {
        trace!(endpoint = %request.endpoint, method = %request.method, "Sending HTTP request");

        match self.execute(&request).await {
            Ok(response) => {
                debug!(endpoint = %request.endpoint, ok = response.ok, "HTTP request completed");
                response
            }
            Err(e) => {
                warn!(endpoint = %request.endpoint, error = %e, "HTTP request failed");
                ApiResponse::failure(e.to_string())
            }
        }
    }
}

/// The request URL carries the credential, so it is stripped from errors.
fn request_error(e: reqwest::Error) -> TransportError {
    TransportError::Request(e.without_url().to_string())
}

fn without_nulls(params: &Value) -> Map<String, Value> {
    match params {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => Map::new(),
    }
}

fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}
