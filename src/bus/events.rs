//! Lifecycle events published per query

use crate::analysis::AnalysisResult;
use crate::results::{ProviderResult, QueryId, QueryRecord};
use serde::{Deserialize, Serialize};

/// Event emitted while a query is processed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    ProviderStarted {
        query_id: QueryId,
        provider: String,
    },
    ProviderCompleted {
        query_id: QueryId,
        provider: String,
        result: ProviderResult,
    },
    AnalysisCompleted {
        query_id: QueryId,
        provider: String,
        analysis: AnalysisResult,
    },
    QueryCompleted {
        query_id: QueryId,
        record: QueryRecord,
    },
    QueryFailed {
        query_id: QueryId,
        error: String,
    },
}

impl NotificationEvent {
    pub fn query_id(&self) -> &str {
        match self {
            Self::ProviderStarted { query_id, .. }
            | Self::ProviderCompleted { query_id, .. }
            | Self::AnalysisCompleted { query_id, .. }
            | Self::QueryCompleted { query_id, .. }
            | Self::QueryFailed { query_id, .. } => query_id,
        }
    }

    /// Provider the event concerns, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::ProviderStarted { provider, .. }
            | Self::ProviderCompleted { provider, .. }
            | Self::AnalysisCompleted { provider, .. } => Some(provider),
            Self::QueryCompleted { .. } | Self::QueryFailed { .. } => None,
        }
    }

    /// Wire name, also used as the SSE event type
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProviderStarted { .. } => "provider_started",
            Self::ProviderCompleted { .. } => "provider_completed",
            Self::AnalysisCompleted { .. } => "analysis_completed",
            Self::QueryCompleted { .. } => "query_completed",
            Self::QueryFailed { .. } => "query_failed",
        }
    }

    /// Whether no further events follow for this query (analysis aside)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::QueryCompleted { .. } | Self::QueryFailed { .. })
    }
}
