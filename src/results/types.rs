//! Provider result type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a submitted query
pub type QueryId = String;

/// A single hit returned by a search provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    /// Page title
    pub title: String,
    /// Target URL
    #[serde(alias = "link")]
    pub url: String,
    /// Description snippet
    #[serde(default)]
    pub snippet: String,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// Normalized response body of a provider call
///
/// Generative providers answer with free text, search providers with an
/// ordered list of hits. Serialized untagged so a JSON export keeps the
/// natural shape (a string or an array).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProviderPayload {
    Text(String),
    Search(Vec<SearchHit>),
}

impl ProviderPayload {
    /// Text of a generative answer
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Search(_) => None,
        }
    }

    /// Hits of a search answer
    pub fn hits(&self) -> Option<&[SearchHit]> {
        match self {
            Self::Text(_) => None,
            Self::Search(hits) => Some(hits),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// Failure classification for a provider call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderError {
    Network,
    Auth,
    RateLimit,
    Timeout,
    MalformedResponse,
    Unknown,
}

impl ProviderError {
    /// Classify a non-success HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            429 => Self::RateLimit,
            500..=599 => Self::Network,
            _ => Self::Unknown,
        }
    }

    /// Wire code, as used in exports and API payloads
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network => "NETWORK",
            Self::Auth => "AUTH",
            Self::RateLimit => "RATE_LIMIT",
            Self::Timeout => "TIMEOUT",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of one provider task within a query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderResult {
    /// Provider identifier
    pub provider: String,
    /// Whether the call produced a usable response
    pub success: bool,
    /// Response payload (present on success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ProviderPayload>,
    /// Model or version label reported by the provider
    #[serde(default)]
    pub model: Option<String>,
    /// Failure classification (present iff `success` is false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
    /// Human-readable failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Total matches reported by a search provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u64>,
    /// Wall-clock duration of the call in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    /// Completion timestamp
    pub completed_at: DateTime<Utc>,
}

impl ProviderResult {
    /// Create a successful result
    pub fn success(provider: impl Into<String>, payload: ProviderPayload) -> Self {
        Self {
            provider: provider.into(),
            success: true,
            response: Some(payload),
            model: None,
            error: None,
            error_message: None,
            total_results: None,
            latency_ms: 0,
            completed_at: Utc::now(),
        }
    }

    /// Create a failed result
    pub fn failure(
        provider: impl Into<String>,
        error: ProviderError,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            success: false,
            response: None,
            model: None,
            error: Some(error),
            error_message: Some(message.into()),
            total_results: None,
            latency_ms: 0,
            completed_at: Utc::now(),
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_total_results(mut self, total: Option<u64>) -> Self {
        self.total_results = total;
        self
    }

    /// Text of a successful generative answer
    pub fn text(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.response.as_ref().and_then(|p| p.as_text())
    }

    /// Whether the result is eligible for secondary analysis
    pub fn is_analyzable(&self) -> bool {
        self.text().is_some()
    }
}
