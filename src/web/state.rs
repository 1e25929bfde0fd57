//! Application state shared across handlers

use crate::analysis::AnalysisPipeline;
use crate::bus::NotificationBus;
use crate::config::Settings;
use crate::network::HttpClient;
use crate::orchestrator::Orchestrator;
use crate::providers::ProviderRegistry;
use crate::store::ResultStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Query orchestrator
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        settings: Settings,
        registry: ProviderRegistry,
        client: HttpClient,
    ) -> anyhow::Result<Self> {
        let registry = Arc::new(registry);
        let outgoing = &settings.outgoing;

        let pipeline = if settings.analysis.enabled {
            match registry.get(&settings.analysis.provider) {
                Some(provider) => {
                    let timeout = settings
                        .analysis
                        .timeout
                        .unwrap_or(outgoing.max_request_timeout);
                    Some(Arc::new(AnalysisPipeline::new(
                        client.clone(),
                        provider.clone(),
                        settings.analysis.clone(),
                        Duration::from_secs_f64(timeout.max(0.0)),
                    )))
                }
                None => {
                    warn!(
                        "Analysis provider {} is not configured; analysis disabled",
                        settings.analysis.provider
                    );
                    None
                }
            }
        } else {
            None
        };

        let store = ResultStore::new().with_archive_dir(settings.store.results_dir.clone());
        let orchestrator = Orchestrator::new(client, registry)
            .with_store(Arc::new(store))
            .with_bus(Arc::new(NotificationBus::new(settings.general.event_buffer)))
            .with_pipeline(pipeline)
            .with_timeout(Duration::from_secs_f64(outgoing.request_timeout.max(0.0)))
            .with_max_timeout(Duration::from_secs_f64(
                outgoing.max_request_timeout.max(0.0),
            ))
            .with_max_tokens(outgoing.max_tokens);

        Ok(Self::with_orchestrator(settings, orchestrator))
    }

    /// Wrap an already configured orchestrator
    pub fn with_orchestrator(settings: Settings, orchestrator: Orchestrator) -> Self {
        Self {
            settings: Arc::new(settings),
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }

    /// Default number of records returned by history
    pub fn history_limit(&self) -> Option<usize> {
        self.settings.store.history_limit
    }
}
