//! Query record aggregating the results of one submission

use super::types::{ProviderResult, QueryId};
use crate::analysis::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of a query
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    #[default]
    Processing,
    Completed,
    Error,
}

impl QueryStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// Aggregate state of one submitted query across its providers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRecord {
    /// Unique query identifier
    pub id: QueryId,
    /// Original query text
    pub query: String,
    /// Creation timestamp
    pub timestamp: DateTime<Utc>,
    /// Current status
    pub status: QueryStatus,
    /// Results keyed by provider identifier
    #[serde(default)]
    pub results: HashMap<String, ProviderResult>,
    /// Analysis keyed by provider identifier
    #[serde(default)]
    pub analysis: Option<HashMap<String, AnalysisResult>>,
    /// Orchestration failure detail (status `error` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryRecord {
    /// Create a new record in `processing` state
    pub fn new(id: impl Into<QueryId>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            timestamp: Utc::now(),
            status: QueryStatus::Processing,
            results: HashMap::new(),
            analysis: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Insert a provider result; an existing key is never replaced
    pub fn insert_result(&mut self, result: ProviderResult) -> bool {
        if self.status != QueryStatus::Processing || self.results.contains_key(&result.provider) {
            return false;
        }
        self.results.insert(result.provider.clone(), result);
        true
    }

    /// Transition `processing -> completed`
    pub fn mark_completed(&mut self) -> bool {
        if self.status != QueryStatus::Processing {
            return false;
        }
        self.status = QueryStatus::Completed;
        true
    }

    /// Transition `processing -> error`
    pub fn mark_failed(&mut self, error: impl Into<String>) -> bool {
        if self.status != QueryStatus::Processing {
            return false;
        }
        self.status = QueryStatus::Error;
        self.error = Some(error.into());
        true
    }

    /// Attach an analysis to a completed record
    pub fn attach_analysis(&mut self, analysis: AnalysisResult) -> bool {
        if self.status != QueryStatus::Completed {
            return false;
        }
        let entries = self.analysis.get_or_insert_with(HashMap::new);
        if entries.contains_key(&analysis.provider) {
            return false;
        }
        entries.insert(analysis.provider.clone(), analysis);
        true
    }

    /// Successful textual results, eligible for analysis
    pub fn analyzable_results(&self) -> Vec<ProviderResult> {
        self.results
            .values()
            .filter(|r| r.is_analyzable())
            .cloned()
            .collect()
    }

    /// Number of providers that answered successfully
    pub fn success_count(&self) -> usize {
        self.results.values().filter(|r| r.success).count()
    }
}
