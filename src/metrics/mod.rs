//! Metrics collection module
//!
//! Tracks provider call counts, error rates and latency.

use crate::results::ProviderResult;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Latency samples kept per provider
const LATENCY_WINDOW: usize = 100;

/// Process-wide metrics collector
pub struct Metrics {
    /// Total submitted queries
    total_queries: AtomicU64,
    /// Calls per provider
    provider_calls: RwLock<HashMap<String, u64>>,
    /// Recent response times in ms
    provider_latency: RwLock<HashMap<String, Vec<u64>>>,
    /// Failure counts by provider
    provider_errors: RwLock<HashMap<String, u64>>,
    /// Success counts by provider
    provider_successes: RwLock<HashMap<String, u64>>,
    /// Analyses attached
    analyses: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_queries: AtomicU64::new(0),
            provider_calls: RwLock::new(HashMap::new()),
            provider_latency: RwLock::new(HashMap::new()),
            provider_errors: RwLock::new(HashMap::new()),
            provider_successes: RwLock::new(HashMap::new()),
            analyses: AtomicU64::new(0),
        }
    }

    pub fn inc_query(&self) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_analysis(&self) {
        self.analyses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one provider call
    pub fn record_result(&self, result: &ProviderResult) {
        let provider = result.provider.as_str();
        *self
            .provider_calls
            .write()
            .entry(provider.to_string())
            .or_insert(0) += 1;

        {
            let mut latency = self.provider_latency.write();
            let samples = latency.entry(provider.to_string()).or_default();
            if samples.len() >= LATENCY_WINDOW {
                samples.remove(0);
            }
            samples.push(result.latency_ms);
        }

        let counter = if result.success {
            &self.provider_successes
        } else {
            &self.provider_errors
        };
        *counter.write().entry(provider.to_string()).or_insert(0) += 1;
    }

    pub fn total_queries(&self) -> u64 {
        self.total_queries.load(Ordering::Relaxed)
    }

    pub fn total_analyses(&self) -> u64 {
        self.analyses.load(Ordering::Relaxed)
    }

    /// Average of the recent response times for a provider
    pub fn avg_latency(&self, provider: &str) -> Option<u64> {
        let latency = self.provider_latency.read();
        latency
            .get(provider)
            .filter(|samples| !samples.is_empty())
            .map(|samples| samples.iter().sum::<u64>() / samples.len() as u64)
    }

    /// Success percentage for a provider
    pub fn reliability(&self, provider: &str) -> f64 {
        let errors = self.provider_errors.read().get(provider).copied().unwrap_or(0);
        let successes = self
            .provider_successes
            .read()
            .get(provider)
            .copied()
            .unwrap_or(0);

        let total = errors + successes;
        if total == 0 {
            100.0
        } else {
            (successes as f64 / total as f64) * 100.0
        }
    }

    /// Statistics for every provider called so far
    pub fn provider_stats(&self) -> HashMap<String, ProviderStats> {
        let calls = self.provider_calls.read().clone();
        calls
            .into_iter()
            .map(|(provider, count)| {
                let stats = ProviderStats {
                    calls: count,
                    successes: self
                        .provider_successes
                        .read()
                        .get(&provider)
                        .copied()
                        .unwrap_or(0),
                    errors: self.provider_errors.read().get(&provider).copied().unwrap_or(0),
                    avg_latency_ms: self.avg_latency(&provider),
                    reliability: self.reliability(&provider),
                };
                (provider, stats)
            })
            .collect()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProviderStats {
    pub calls: u64,
    pub successes: u64,
    pub errors: u64,
    pub avg_latency_ms: Option<u64>,
    pub reliability: f64,
}
