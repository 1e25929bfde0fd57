//! Result types and query records
//!
//! This module defines the normalized provider result and the per-query
//! record that aggregates them.

mod record;
mod types;

pub use record::{QueryRecord, QueryStatus};
pub use types::*;
