//! Submission models

use crate::results::QueryId;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reasons a submission is rejected before any record exists
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("no providers are configured")]
    ServiceUnavailable,
}

impl RequestError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Wire code used by the API
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

/// Shared bookkeeping for one in-flight query
#[derive(Debug)]
pub(crate) struct QueryRun {
    pub id: QueryId,
    pub query: String,
    outstanding: AtomicUsize,
}

impl QueryRun {
    pub fn new(id: QueryId, query: String, tasks: usize) -> Self {
        Self {
            id,
            query,
            outstanding: AtomicUsize::new(tasks),
        }
    }

    /// Mark one provider task settled; true for the task that settles last
    pub fn settle(&self) -> bool {
        self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }
}
