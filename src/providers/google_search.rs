//! Google Custom Search adapter

use super::traits::*;
use crate::config::ProviderConfig;
use crate::results::{ProviderPayload, SearchHit};
use crate::SEARCH_RESULT_LIMIT;
use anyhow::Result as AnyhowResult;
use serde::Deserialize;

pub const CUSTOM_SEARCH_BASE_URL: &str = "https://www.googleapis.com";

/// Programmable search engine client
pub struct GoogleSearch {
    name: String,
    base_url: String,
    api_key: String,
    cx: String,
    timeout: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchHit>,
    search_information: Option<SearchInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchInformation {
    total_results: Option<String>,
}

impl GoogleSearch {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(CUSTOM_SEARCH_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            cx: config.cx.clone().unwrap_or_default(),
            timeout: config.timeout,
        }
    }
}

impl Provider for GoogleSearch {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Search
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://programmablesearchengine.google.com")
            .api_key_required(true)
    }

    fn model(&self) -> Option<String> {
        Some("Custom Search API".to_string())
    }

    fn timeout(&self) -> Option<f64> {
        self.timeout
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<ProviderRequest> {
        Ok(ProviderRequest::get(format!("{}/customsearch/v1", self.base_url))
            .param("key", &self.api_key)
            .param("cx", &self.cx)
            .param("q", &params.query)
            .param("num", SEARCH_RESULT_LIMIT.to_string()))
    }

    fn response(&self, response: ProviderResponse) -> Result<ProviderOutput, ProviderFailure> {
        let parsed: SearchResponse = response.json()?;

        // No `items` key means no matches, which is still a success
        let hits: Vec<SearchHit> = parsed
            .items
            .into_iter()
            .take(SEARCH_RESULT_LIMIT)
            .collect();
        let total_results = parsed
            .search_information
            .and_then(|info| info.total_results)
            .and_then(|total| total.parse().ok());

        Ok(ProviderOutput {
            payload: ProviderPayload::Search(hits),
            model: self.model(),
            total_results,
        })
    }

    fn validate(&self, _config: &ProviderConfig) -> AnyhowResult<()> {
        if self.cx.is_empty() {
            anyhow::bail!("google_search requires a search engine id (cx)");
        }
        Ok(())
    }
}
