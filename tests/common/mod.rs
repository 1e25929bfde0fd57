//! Shared helpers for integration tests

#![allow(dead_code)]

use aiseo_rs::config::ProviderConfig;
use aiseo_rs::network::HttpClient;
use aiseo_rs::orchestrator::Orchestrator;
use aiseo_rs::providers::{
    Provider, ProviderFailure, ProviderKind, ProviderOutput, ProviderRegistry, ProviderRequest,
    ProviderResponse, RequestParams,
};
use aiseo_rs::results::{ProviderError, ProviderPayload, QueryRecord, SearchHit};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted behaviour of a mock provider
#[derive(Clone)]
pub enum Script {
    /// Answer with text after a delay
    Text(&'static str, Duration),
    /// Return `n` search hits
    Hits(usize),
    /// Fail with the given classification
    Fail(ProviderError),
    /// Sleep longer than any test timeout
    Hang,
}

/// In-process provider double
pub struct MockProvider {
    name: String,
    script: Script,
    pub calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn text(name: &str, reply: &'static str) -> Arc<Self> {
        Self::new(name, Script::Text(reply, Duration::from_millis(5)))
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        match self.script {
            Script::Hits(_) => ProviderKind::Search,
            _ => ProviderKind::Generative,
        }
    }

    fn model(&self) -> Option<String> {
        Some(format!("{}-model", self.name))
    }

    fn request(&self, _params: &RequestParams) -> anyhow::Result<ProviderRequest> {
        Ok(ProviderRequest::get("http://127.0.0.1:9/unused"))
    }

    fn response(&self, _response: ProviderResponse) -> Result<ProviderOutput, ProviderFailure> {
        Err(ProviderFailure::malformed("mock providers do not parse responses"))
    }

    async fn call(
        &self,
        _client: &HttpClient,
        _params: &RequestParams,
    ) -> Result<ProviderOutput, ProviderFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Text(reply, delay) => {
                tokio::time::sleep(delay).await;
                Ok(ProviderOutput::text(reply))
            }
            Script::Hits(n) => {
                let hits = (0..n)
                    .map(|i| {
                        SearchHit::new(
                            format!("Result {}", i),
                            format!("https://example.com/{}", i),
                            "snippet",
                        )
                    })
                    .collect();
                Ok(ProviderOutput {
                    payload: ProviderPayload::Search(hits),
                    model: None,
                    total_results: Some(n as u64),
                })
            }
            Script::Fail(kind) => Err(ProviderFailure::new(kind, "scripted failure")),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(ProviderOutput::text("too late"))
            }
        }
    }
}

/// Registry holding the given providers
pub fn registry(providers: Vec<Arc<MockProvider>>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        let config = ProviderConfig::new(provider.name().to_string());
        registry.register(provider, config);
    }
    registry
}

/// Orchestrator over mock providers with a short per-call timeout
pub fn orchestrator(providers: Vec<Arc<MockProvider>>) -> Orchestrator {
    Orchestrator::new(
        HttpClient::new().expect("client"),
        Arc::new(registry(providers)),
    )
    .with_timeout(Duration::from_millis(300))
}

pub fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Poll until the record leaves `processing`
pub async fn wait_terminal(orchestrator: &Orchestrator, id: &str) -> QueryRecord {
    for _ in 0..200 {
        let record = orchestrator.get(id).expect("record exists");
        if record.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("query {} did not finish", id);
}

/// Poll until the event channel of a query is torn down
pub async fn wait_closed(orchestrator: &Orchestrator, id: &str) {
    for _ in 0..200 {
        if !orchestrator.bus().is_open(id) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("channel for {} never closed", id);
}
