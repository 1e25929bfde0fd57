//! AISEO-RS: fan one query out to many LLM and search providers
//!
//! Results are aggregated per query, progress is streamed to observers as it
//! happens, and successful textual answers can be mined for AISEO insights.

pub mod analysis;
pub mod bus;
pub mod config;
pub mod metrics;
pub mod network;
pub mod orchestrator;
pub mod providers;
pub mod results;
pub mod store;
pub mod web;

pub use config::Settings;
pub use orchestrator::{Orchestrator, RequestError};
pub use providers::Provider;
pub use results::{ProviderResult, QueryRecord};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for provider calls in seconds
pub const DEFAULT_TIMEOUT: u64 = 30;

/// Maximum timeout that can be set
pub const MAX_TIMEOUT: u64 = 120;

/// Number of hits returned by search providers
pub const SEARCH_RESULT_LIMIT: usize = 10;
