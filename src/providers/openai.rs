//! OpenAI chat completions adapter
//!
//! Also serves Perplexity, which exposes the same wire format under a
//! different base URL.

use super::traits::*;
use crate::config::ProviderConfig;
use anyhow::Result as AnyhowResult;
use serde_json::json;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

const OPENAI_MODEL: &str = "gpt-4o-mini";
const PERPLEXITY_MODEL: &str = "llama-3.1-sonar-small-128k-online";

/// Chat completions client for OpenAI-compatible APIs
pub struct OpenAi {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Option<f64>,
    max_tokens: Option<u32>,
    temperature: f32,
    website: &'static str,
}

impl OpenAi {
    /// OpenAI proper
    pub fn new(config: &ProviderConfig) -> Self {
        Self::build(config, OPENAI_BASE_URL, OPENAI_MODEL, "https://openai.com")
    }

    /// Perplexity through its OpenAI-compatible endpoint
    pub fn perplexity(config: &ProviderConfig) -> Self {
        Self::build(
            config,
            PERPLEXITY_BASE_URL,
            PERPLEXITY_MODEL,
            "https://www.perplexity.ai",
        )
    }

    fn build(
        config: &ProviderConfig,
        base_url: &str,
        model: &str,
        website: &'static str,
    ) -> Self {
        Self {
            name: config.name.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| base_url.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone().unwrap_or_else(|| model.to_string()),
            timeout: config.timeout,
            max_tokens: config.max_tokens,
            temperature: config.temperature.unwrap_or(0.7),
            website,
        }
    }
}

impl Provider for OpenAi {
    fn name(&self) -> &str {
        &self.name
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website(self.website)
            .api_key_required(true)
    }

    fn model(&self) -> Option<String> {
        Some(self.model.clone())
    }

    fn timeout(&self) -> Option<f64> {
        self.timeout
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<ProviderRequest> {
        let mut messages = Vec::new();
        if let Some(ref system) = params.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": params.query}));

        let mut body = json!({
            "model": params.model.as_deref().unwrap_or(&self.model),
            "messages": messages,
            "max_tokens": self.max_tokens.unwrap_or(params.max_tokens),
            "temperature": params.temperature.unwrap_or(self.temperature),
        });
        if params.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        Ok(ProviderRequest::post(format!("{}/chat/completions", self.base_url))
            .bearer(&self.api_key)
            .json(body))
    }

    fn response(&self, response: ProviderResponse) -> Result<ProviderOutput, ProviderFailure> {
        let json: serde_json::Value = response.json()?;
        let text = required_text(&json, "/choices/0/message/content")?;
        let model = json
            .get("model")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string());
        Ok(ProviderOutput::text(text).with_model(model))
    }
}
