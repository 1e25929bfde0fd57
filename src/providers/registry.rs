//! Provider registry for managing configured providers

use super::traits::{Provider, ProviderKind};
use crate::config::ProviderConfig;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Public description of a registered provider
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub kind: ProviderKind,
    pub model: Option<String>,
    pub website: Option<String>,
    pub requires_api_key: bool,
    pub enabled: bool,
}

/// Registry of all usable providers, keyed by identifier
pub struct ProviderRegistry {
    /// Providers by name
    providers: HashMap<String, Arc<dyn Provider>>,
    /// Provider configurations
    configs: HashMap<String, ProviderConfig>,
    /// Registration order, for stable listings
    order: Vec<String>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            configs: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a provider; a later registration under the same name replaces it
    pub fn register(&mut self, provider: Arc<dyn Provider>, config: ProviderConfig) {
        let name = provider.name().to_string();
        if !self.providers.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.providers.insert(name.clone(), provider);
        self.configs.insert(name, config);
    }

    /// Get a provider by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(name)
    }

    /// Get provider config
    pub fn get_config(&self, name: &str) -> Option<&ProviderConfig> {
        self.configs.get(name)
    }

    /// Get all provider names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    /// Check if a provider exists
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Get number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Effective timeout in seconds: config, then adapter override, then `default`
    pub fn get_timeout(&self, name: &str, default: f64) -> f64 {
        self.configs
            .get(name)
            .and_then(|c| c.timeout)
            .or_else(|| self.providers.get(name).and_then(|p| p.timeout()))
            .unwrap_or(default)
    }

    /// Describe every registered provider
    pub fn info(&self) -> Vec<ProviderInfo> {
        self.order
            .iter()
            .filter_map(|name| {
                let provider = self.providers.get(name)?;
                let display = self
                    .configs
                    .get(name)
                    .map(|c| c.display_name())
                    .unwrap_or_else(|| name.clone());
                let about = provider.about();
                Some(ProviderInfo {
                    id: name.clone(),
                    name: display,
                    kind: provider.kind(),
                    model: provider.model(),
                    website: about.website,
                    requires_api_key: about.require_api_key,
                    enabled: true,
                })
            })
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
