//! Settings structures for AISEO-RS configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main settings structure loaded from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub providers: Vec<ProviderConfig>,
    pub analysis: AnalysisSettings,
    pub store: StoreSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            providers: default_providers(),
            analysis: AnalysisSettings::default(),
            store: StoreSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with process environment variables
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge with variables from an arbitrary lookup
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("AISEO_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(port) = lookup("AISEO_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = lookup("AISEO_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(tokens) = lookup("MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.outgoing.max_tokens = tokens;
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.outgoing.request_timeout = timeout;
        }
        if let Some(val) = lookup("ANALYZE_RESPONSES") {
            self.analysis.enabled = val.eq_ignore_ascii_case("true");
        }
        if let Some(val) = lookup("ANALYSIS_MODEL") {
            self.analysis.model = Some(val);
        }
        if let Some(val) = lookup("ANALYSIS_CSV_PATH") {
            self.analysis.csv_path = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("AISEO_RESULTS_DIR") {
            self.store.results_dir = Some(PathBuf::from(val));
        }

        for provider in &mut self.providers {
            let (key_var, model_var) = match provider.provider.as_str() {
                "openai" => ("OPENAI_API_KEY", Some("OPENAI_MODEL")),
                "anthropic" => ("ANTHROPIC_API_KEY", Some("ANTHROPIC_MODEL")),
                "perplexity" => ("PERPLEXITY_API_KEY", Some("PERPLEXITY_MODEL")),
                "google" => ("GOOGLE_API_KEY", Some("GOOGLE_MODEL")),
                "google_search" => ("GOOGLE_SEARCH_API_KEY", None),
                _ => continue,
            };
            if let Some(key) = lookup(key_var) {
                provider.api_key = Some(key);
            }
            if let Some(model) = model_var.and_then(&lookup) {
                provider.model = Some(model);
            }
            if provider.provider == "google_search" {
                if let Some(cx) = lookup("GOOGLE_SEARCH_CX") {
                    provider.cx = Some(cx);
                }
            }
        }
    }

    /// Get provider config by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Providers that are enabled and carry usable credentials
    pub fn configured_providers(&self) -> Vec<&ProviderConfig> {
        self.providers.iter().filter(|p| p.is_configured()).collect()
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the API
    pub instance_name: String,
    /// Per-query notification buffer size
    pub event_buffer: usize,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "AISEO".to_string(),
            event_buffer: 256,
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default per-provider timeout in seconds
    pub request_timeout: f64,
    /// Upper bound for any per-provider timeout
    pub max_request_timeout: f64,
    /// Default output token budget for generative providers
    pub max_tokens: u32,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT as f64,
            max_request_timeout: crate::MAX_TIMEOUT as f64,
            max_tokens: 1000,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name (unique identifier)
    pub name: String,
    /// Adapter to use
    pub provider: String,
    /// Whether the provider is disabled
    pub disabled: bool,
    /// API credential
    pub api_key: Option<String>,
    /// Search engine id (Google Custom Search only)
    pub cx: Option<String>,
    /// Model label
    pub model: Option<String>,
    /// Override for the vendor base URL
    pub base_url: Option<String>,
    /// Custom timeout for this provider in seconds
    pub timeout: Option<f64>,
    /// Output token budget
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Display name
    pub display_name: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: String::new(),
            disabled: false,
            api_key: None,
            cx: None,
            model: None,
            base_url: None,
            timeout: None,
            max_tokens: None,
            temperature: None,
            display_name: None,
        }
    }
}

impl ProviderConfig {
    /// Create a config for the given adapter, named after it
    pub fn new(provider: impl Into<String>) -> Self {
        let provider = provider.into();
        Self {
            name: provider.clone(),
            provider,
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Whether the provider is enabled and has real credentials
    pub fn is_configured(&self) -> bool {
        if self.disabled || !has_value(&self.api_key) {
            return false;
        }
        self.provider != "google_search" || has_value(&self.cx)
    }

    /// Name shown to API clients
    pub fn display_name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| title_case(&self.name))
    }
}

/// Analysis pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Run the extraction pass after each query
    pub enabled: bool,
    /// Provider used for the extraction call
    pub provider: String,
    /// Model override for the extraction call
    pub model: Option<String>,
    /// Output token budget for the extraction call
    pub max_tokens: u32,
    /// Sampling temperature for the extraction call
    pub temperature: f32,
    /// Responses longer than this are truncated before extraction
    pub max_input_chars: usize,
    /// Timeout for the extraction call in seconds
    pub timeout: Option<f64>,
    /// CSV ledger path (none disables the ledger)
    pub csv_path: Option<PathBuf>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "openai".to_string(),
            model: None,
            max_tokens: 4000,
            temperature: 0.3,
            max_input_chars: 5000,
            timeout: None,
            csv_path: Some(PathBuf::from("analysis_results.csv")),
        }
    }
}

/// Result store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory receiving a JSON copy of every completed record
    pub results_dir: Option<PathBuf>,
    /// Default number of records returned by history
    pub history_limit: Option<usize>,
}

/// Whether a credential is present and not a template placeholder
fn has_value(value: &Option<String>) -> bool {
    match value.as_deref().map(str::trim) {
        None | Some("") => false,
        Some(v) => !["your-", "sk-your", "sk-ant-your", "pplx-your"]
            .iter()
            .any(|prefix| v.starts_with(prefix)),
    }
}

/// `google_search` -> `Google Search`
fn title_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Default provider configurations (credentials come from the environment)
fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            display_name: Some("OpenAI".to_string()),
            ..ProviderConfig::new("openai")
        },
        ProviderConfig::new("anthropic"),
        ProviderConfig::new("perplexity"),
        ProviderConfig::new("google"),
        ProviderConfig::new("google_search"),
    ]
}
