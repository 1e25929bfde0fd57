//! Google Gemini adapter

use super::traits::*;
use crate::config::ProviderConfig;
use anyhow::Result as AnyhowResult;
use serde_json::json;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini generateContent client
pub struct Gemini {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Option<f64>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl Gemini {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(GEMINI_BASE_URL)
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

impl Provider for Gemini {
    fn name(&self) -> &str {
        &self.name
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://ai.google.dev")
            .api_key_required(true)
    }

    fn model(&self) -> Option<String> {
        Some(self.model.clone())
    }

    fn timeout(&self) -> Option<f64> {
        self.timeout
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<ProviderRequest> {
        let model = params.model.as_deref().unwrap_or(&self.model);

        let mut generation = json!({
            "maxOutputTokens": self.max_tokens.unwrap_or(params.max_tokens),
        });
        if let Some(temperature) = params.temperature.or(self.temperature) {
            generation["temperature"] = json!(temperature);
        }
        if params.json_mode {
            generation["responseMimeType"] = json!("application/json");
        }

        let mut body = json!({
            "contents": [{"role": "user", "parts": [{"text": params.query}]}],
            "generationConfig": generation,
        });
        if let Some(ref system) = params.system {
            body["systemInstruction"] = json!({"parts": [{"text": system}]});
        }

        Ok(ProviderRequest::post(format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model
        ))
        .param("key", &self.api_key)
        .json(body))
    }

    fn response(&self, response: ProviderResponse) -> Result<ProviderOutput, ProviderFailure> {
        let json: serde_json::Value = response.json()?;

        // A reply may be split across several parts
        let text: String = json
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderFailure::malformed("no candidate text in response"));
        }

        let model = json
            .get("modelVersion")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string());
        Ok(ProviderOutput::text(text).with_model(model))
    }
}
