//! Provider loader for initializing providers from configuration

use super::registry::ProviderRegistry;
use super::traits::Provider;
use super::{Anthropic, Gemini, GoogleSearch, OpenAi};
use crate::config::{ProviderConfig, Settings};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing providers from configuration
pub struct ProviderLoader;

impl ProviderLoader {
    /// Load every usable provider from settings
    pub fn load(settings: &Settings) -> Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();

        for config in &settings.providers {
            if config.disabled {
                info!("Skipping disabled provider: {}", config.name);
                continue;
            }
            if !config.is_configured() {
                info!("Skipping unconfigured provider: {}", config.name);
                continue;
            }

            match Self::create_provider(config) {
                Ok(provider) => {
                    info!("Loaded provider: {} ({})", config.name, config.provider);
                    registry.register(provider, config.clone());
                }
                Err(e) => {
                    warn!("Failed to load provider {}: {}", config.name, e);
                }
            }
        }

        info!("Loaded {} providers", registry.len());
        Ok(registry)
    }

    /// Create a provider instance from its config
    pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
        if let Some(ref base_url) = config.base_url {
            url::Url::parse(base_url)
                .map_err(|e| anyhow::anyhow!("invalid base_url {}: {}", base_url, e))?;
        }

        let provider: Box<dyn Provider> = match config.provider.as_str() {
            "openai" => Box::new(OpenAi::new(config)),
            "perplexity" => Box::new(OpenAi::perplexity(config)),
            "anthropic" => Box::new(Anthropic::new(config)),
            "google" | "gemini" => Box::new(Gemini::new(config)),
            "google_search" => Box::new(GoogleSearch::new(config)),
            other => {
                return Err(anyhow::anyhow!("Unknown provider type: {}", other));
            }
        };

        provider.validate(config)?;

        Ok(Arc::from(provider))
    }

    /// Get list of available provider types
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openai", "perplexity", "anthropic", "google", "google_search"]
    }
}
