//! Provider traits and types

use crate::config::ProviderConfig;
use crate::network::HttpClient;
use crate::results::{ProviderError, ProviderPayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of answer a provider produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Free-text answer from a language model
    Generative,
    /// Ranked list of web hits
    Search,
}

/// Parameters for building a provider request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestParams {
    /// Prompt or search query
    pub query: String,
    /// Optional system instruction
    pub system: Option<String>,
    /// Output token budget
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Ask the vendor for a JSON object reply
    pub json_mode: bool,
    /// Model override for this call
    pub model: Option<String>,
}

impl RequestParams {
    /// Create new request parameters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            system: None,
            max_tokens: 1000,
            temperature: None,
            json_mode: false,
            model: None,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    pub fn model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// HTTP request to be made for a provider
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// JSON body
    pub body: Option<serde_json::Value>,
}

impl ProviderRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::with_method(url, HttpMethod::Get)
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::with_method(url, HttpMethod::Post)
    }

    fn with_method(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            params: HashMap::new(),
            body: None,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a bearer authorization header
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the JSON body
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP response from a provider request
#[derive(Debug)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl ProviderResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProviderFailure> {
        serde_json::from_str(&self.text).map_err(|e| ProviderFailure::malformed(e.to_string()))
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Classified failure of a provider call
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProviderFailure {
    pub kind: ProviderError,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(kind: ProviderError, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderError::MalformedResponse, message)
    }

    /// Failure for a non-2xx HTTP status
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail: String = body.chars().take(200).collect();
        Self::new(
            ProviderError::from_status(status),
            format!("HTTP {}: {}", status, detail.trim()),
        )
    }

    /// Classify an error raised while sending the request or reading the body
    pub fn from_transport(err: anyhow::Error) -> Self {
        let kind = match err.downcast_ref::<reqwest::Error>() {
            Some(e) if e.is_timeout() => ProviderError::Timeout,
            Some(e) if e.is_decode() || e.is_body() => ProviderError::MalformedResponse,
            Some(e) if e.is_connect() || e.is_request() || e.is_redirect() => {
                ProviderError::Network
            }
            Some(_) => ProviderError::Network,
            None => ProviderError::Unknown,
        };
        Self::new(kind, err.to_string())
    }
}

/// Normalized output of a successful call
#[derive(Debug, Clone)]
pub struct ProviderOutput {
    pub payload: ProviderPayload,
    /// Model label reported by the vendor, if any
    pub model: Option<String>,
    pub total_results: Option<u64>,
}

impl ProviderOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            payload: ProviderPayload::Text(text.into()),
            model: None,
            total_results: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// Main provider trait that all adapters implement
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider identifier
    fn name(&self) -> &str;

    /// Kind of answer produced
    fn kind(&self) -> ProviderKind {
        ProviderKind::Generative
    }

    /// Short description of the provider
    fn about(&self) -> ProviderAbout {
        ProviderAbout::default()
    }

    /// Configured model label
    fn model(&self) -> Option<String> {
        None
    }

    /// Timeout override in seconds; `None` defers to the caller's default
    fn timeout(&self) -> Option<f64> {
        None
    }

    /// Build the HTTP request for a call
    fn request(&self, params: &RequestParams) -> anyhow::Result<ProviderRequest>;

    /// Parse a 2xx HTTP response into a normalized output
    fn response(&self, response: ProviderResponse) -> Result<ProviderOutput, ProviderFailure>;

    /// Optional validation of configuration
    fn validate(&self, _config: &ProviderConfig) -> anyhow::Result<()> {
        Ok(())
    }

    /// Perform one call: build, send, classify, parse
    async fn call(
        &self,
        client: &HttpClient,
        params: &RequestParams,
    ) -> Result<ProviderOutput, ProviderFailure> {
        let request = self
            .request(params)
            .map_err(|e| ProviderFailure::new(ProviderError::Unknown, e.to_string()))?;
        let response = client
            .execute(request)
            .await
            .map_err(ProviderFailure::from_transport)?;
        if !response.is_success() {
            return Err(ProviderFailure::from_status(response.status, &response.text));
        }
        let output = self.response(response)?;
        Ok(ProviderOutput {
            model: output.model.or_else(|| self.model()),
            ..output
        })
    }
}

/// Provider metadata
#[derive(Debug, Clone, Default)]
pub struct ProviderAbout {
    /// Vendor website
    pub website: Option<String>,
    /// Whether an API key is required
    pub require_api_key: bool,
}

impl ProviderAbout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn api_key_required(mut self, required: bool) -> Self {
        self.require_api_key = required;
        self
    }
}

/// Extract the first string found at a JSON pointer, erroring when absent or blank
pub(crate) fn required_text(
    json: &serde_json::Value,
    pointer: &str,
) -> Result<String, ProviderFailure> {
    match json.pointer(pointer).and_then(|v| v.as_str()) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        Some(_) => Err(ProviderFailure::malformed("empty response text")),
        None => Err(ProviderFailure::malformed(format!(
            "missing field {}",
            pointer
        ))),
    }
}
