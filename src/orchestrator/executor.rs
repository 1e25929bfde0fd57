//! Query fan-out and aggregation

use super::models::{QueryRun, RequestError};
use crate::analysis::{AnalysisPipeline, AnalysisResult};
use crate::bus::{NotificationBus, NotificationEvent, Subscription};
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::providers::{invoke, Provider, ProviderInfo, ProviderRegistry, RequestParams};
use crate::results::{ProviderResult, QueryId, QueryRecord};
use crate::store::{ExportFormat, ResultStore, StoreError};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Coordinates provider tasks, the store and the bus for every query
#[derive(Clone)]
pub struct Orchestrator {
    /// HTTP client shared by all provider calls
    client: HttpClient,
    /// Usable providers
    registry: Arc<ProviderRegistry>,
    store: Arc<ResultStore>,
    bus: Arc<NotificationBus>,
    /// Present only when analysis is enabled
    pipeline: Option<Arc<AnalysisPipeline>>,
    metrics: Arc<Metrics>,
    default_timeout: Duration,
    max_timeout: Duration,
    max_tokens: u32,
}

impl Orchestrator {
    pub fn new(client: HttpClient, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            client,
            registry,
            store: Arc::new(ResultStore::new()),
            bus: Arc::new(NotificationBus::default()),
            pipeline: None,
            metrics: Arc::new(Metrics::new()),
            default_timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
            max_timeout: Duration::from_secs(crate::MAX_TIMEOUT),
            max_tokens: 1000,
        }
    }

    pub fn with_store(mut self, store: Arc<ResultStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_bus(mut self, bus: Arc<NotificationBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_pipeline(mut self, pipeline: Option<Arc<AnalysisPipeline>>) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set default per-provider timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the ceiling for any per-provider timeout
    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Submit a query to the given providers
    ///
    /// Validation happens before anything is created. On success the record
    /// exists in `processing` state and one task per provider is running.
    pub fn submit(&self, query: &str, providers: &[String]) -> Result<QueryId, RequestError> {
        let selected = self.select(query, providers)?;
        let text = query.trim().to_string();
        let id = uuid::Uuid::new_v4().to_string();

        self.store.insert(QueryRecord::new(id.clone(), text.clone()));
        self.bus.open(&id);
        self.metrics.inc_query();

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                self.abort(&id, format!("dispatch could not start: {}", e));
                return Ok(id);
            }
        };

        info!(
            "Dispatching query {} '{}' to {} providers",
            id,
            text,
            selected.len()
        );

        let run = Arc::new(QueryRun::new(id.clone(), text, selected.len()));
        for provider in selected {
            let this = self.clone();
            let run = run.clone();
            handle.spawn(async move {
                this.run_provider(run, provider).await;
            });
        }

        Ok(id)
    }

    /// Submit a query to every registered provider
    pub fn submit_all(&self, query: &str) -> Result<QueryId, RequestError> {
        let providers: Vec<String> = self.registry.names().iter().map(|s| s.to_string()).collect();
        self.submit(query, &providers)
    }

    fn select(
        &self,
        query: &str,
        providers: &[String],
    ) -> Result<Vec<Arc<dyn Provider>>, RequestError> {
        if self.registry.is_empty() {
            return Err(RequestError::ServiceUnavailable);
        }
        if query.trim().is_empty() {
            return Err(RequestError::invalid("query text is empty"));
        }
        if providers.is_empty() {
            return Err(RequestError::invalid("no providers selected"));
        }

        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for name in providers {
            let provider = self
                .registry
                .get(name)
                .ok_or_else(|| RequestError::invalid(format!("unknown provider: {}", name)))?;
            if seen.insert(name.as_str()) {
                selected.push(provider.clone());
            }
        }
        Ok(selected)
    }

    /// Move a record straight to `error`
    fn abort(&self, id: &str, reason: String) {
        error!("Query {} failed: {}", id, reason);
        if let Err(e) = self.store.fail(id, &reason) {
            error!("Could not mark query {} failed: {}", id, e);
        }
        self.bus.publish(NotificationEvent::QueryFailed {
            query_id: id.to_string(),
            error: reason,
        });
        self.bus.close(id);
    }

    fn provider_timeout(&self, name: &str) -> Duration {
        let seconds = self
            .registry
            .get_timeout(name, self.default_timeout.as_secs_f64())
            .min(self.max_timeout.as_secs_f64())
            .max(0.0);
        Duration::from_secs_f64(seconds)
    }

    async fn run_provider(&self, run: Arc<QueryRun>, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        let timeout = self.provider_timeout(&name);

        self.bus.publish(NotificationEvent::ProviderStarted {
            query_id: run.id.clone(),
            provider: name.clone(),
        });
        debug!("Calling provider {} with timeout {:?}", name, timeout);

        let params = RequestParams::new(run.query.clone()).max_tokens(self.max_tokens);
        let result = invoke(provider.as_ref(), &self.client, &params, timeout).await;
        self.metrics.record_result(&result);

        match self.store.record_result(&run.id, result.clone()) {
            Ok(true) => {}
            Ok(false) => warn!("Result for {} on query {} was not stored", name, run.id),
            Err(e) => error!("Failed to store result for {}: {}", name, e),
        }

        self.bus.publish(NotificationEvent::ProviderCompleted {
            query_id: run.id.clone(),
            provider: name,
            result,
        });

        if run.settle() {
            self.finish(&run).await;
        }
    }

    /// Called by the last provider task of a query
    async fn finish(&self, run: &QueryRun) {
        let record = match self.store.complete(&run.id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!("Query {} was already terminal", run.id);
                return;
            }
            Err(e) => {
                error!("Failed to complete query {}: {}", run.id, e);
                return;
            }
        };

        info!(
            "Query {} completed: {}/{} providers succeeded",
            run.id,
            record.success_count(),
            record.results.len()
        );

        let eligible = record.analyzable_results();
        self.bus.publish(NotificationEvent::QueryCompleted {
            query_id: run.id.clone(),
            record,
        });

        match self.store.archive(&run.id).await {
            Ok(Some(path)) => debug!("Archived query {} to {:?}", run.id, path),
            Ok(None) => {}
            Err(e) => error!("Failed to archive query {}: {}", run.id, e),
        }

        match self.pipeline {
            Some(ref pipeline) if !eligible.is_empty() => {
                let this = self.clone();
                let pipeline = pipeline.clone();
                let id = run.id.clone();
                let query = run.query.clone();
                tokio::spawn(async move {
                    this.run_analysis(pipeline, id, query, eligible).await;
                });
            }
            _ => self.bus.close(&run.id),
        }
    }

    async fn run_analysis(
        &self,
        pipeline: Arc<AnalysisPipeline>,
        id: QueryId,
        query: String,
        eligible: Vec<ProviderResult>,
    ) {
        info!("Analysing {} responses for query {}", eligible.len(), id);

        let mut pending: FuturesUnordered<_> = eligible
            .iter()
            .map(|result| {
                let pipeline = &pipeline;
                let query = &query;
                async move { (result.provider.clone(), pipeline.analyze(query, result).await) }
            })
            .collect();

        while let Some((provider, outcome)) = pending.next().await {
            let analysis = match outcome {
                Ok(analysis) => analysis,
                Err(e) => {
                    warn!("No analysis for {} on query {}: {}", provider, id, e);
                    continue;
                }
            };

            match self.store.attach_analysis(&id, analysis.clone()) {
                Ok(true) => {
                    self.metrics.inc_analysis();
                    self.bus.publish(NotificationEvent::AnalysisCompleted {
                        query_id: id.clone(),
                        provider: provider.clone(),
                        analysis: analysis.clone(),
                    });
                    pipeline.record(&query, &analysis).await;
                }
                Ok(false) => debug!("Analysis for {} already attached", provider),
                Err(e) => error!("Failed to attach analysis for {}: {}", provider, e),
            }
        }

        self.bus.close(&id);
    }

    /// Current snapshot of a record
    pub fn get(&self, id: &str) -> Result<QueryRecord, StoreError> {
        self.store.get(id)
    }

    /// Records, most recent first
    pub fn history(&self, limit: Option<usize>) -> Vec<QueryRecord> {
        self.store.history(limit)
    }

    /// Analysis mapping of a record
    pub fn analysis(&self, id: &str) -> Result<HashMap<String, AnalysisResult>, StoreError> {
        self.store.analysis(id)
    }

    pub fn export(&self, id: &str, format: ExportFormat) -> Result<String, StoreError> {
        self.store.export(id, format)
    }

    /// Event stream for a known query; already ended if the query is done
    pub fn subscribe(&self, id: &str) -> Result<Subscription, StoreError> {
        if !self.store.contains(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(self
            .bus
            .subscribe(id)
            .unwrap_or_else(|| Subscription::closed(id)))
    }

    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.registry.info()
    }

    pub fn analysis_enabled(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn pipeline(&self) -> Option<&Arc<AnalysisPipeline>> {
        self.pipeline.as_ref()
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<NotificationBus> {
        &self.bus
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
