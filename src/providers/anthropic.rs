//! Anthropic messages adapter

use super::traits::*;
use crate::config::ProviderConfig;
use anyhow::Result as AnyhowResult;
use serde_json::json;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Anthropic messages API client
pub struct Anthropic {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Option<f64>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl Anthropic {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(ANTHROPIC_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: config.timeout,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

impl Provider for Anthropic {
    fn name(&self) -> &str {
        &self.name
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://www.anthropic.com")
            .api_key_required(true)
    }

    fn model(&self) -> Option<String> {
        Some(self.model.clone())
    }

    fn timeout(&self) -> Option<f64> {
        self.timeout
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<ProviderRequest> {
        let mut body = json!({
            "model": params.model.as_deref().unwrap_or(&self.model),
            "max_tokens": self.max_tokens.unwrap_or(params.max_tokens),
            "messages": [{"role": "user", "content": params.query}],
        });
        if let Some(ref system) = params.system {
            body["system"] = json!(system);
        }
        if let Some(temperature) = params.temperature.or(self.temperature) {
            body["temperature"] = json!(temperature);
        }

        Ok(ProviderRequest::post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body))
    }

    fn response(&self, response: ProviderResponse) -> Result<ProviderOutput, ProviderFailure> {
        let json: serde_json::Value = response.json()?;
        let text = required_text(&json, "/content/0/text")?;
        let model = json
            .get("model")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string());
        Ok(ProviderOutput::text(text).with_model(model))
    }
}
