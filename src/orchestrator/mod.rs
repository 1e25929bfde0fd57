//! Query orchestration module
//!
//! Fans a query out to its providers, aggregates the results into the store
//! and drives lifecycle notifications and the follow-up analysis.

mod executor;
mod models;

pub use executor::Orchestrator;
pub use models::RequestError;
