//! HTTP networking module
//!
//! Provides the HTTP client used by every provider adapter.

mod client;

pub use client::HttpClient;
