//! Provider module
//!
//! Defines the Provider trait, the registry of configured providers and the
//! concrete vendor adapters.

mod invoke;
mod loader;
mod registry;
mod traits;

// Provider implementations
pub mod anthropic;
pub mod gemini;
pub mod google_search;
pub mod openai;

pub use anthropic::Anthropic;
pub use gemini::Gemini;
pub use google_search::GoogleSearch;
pub use invoke::invoke;
pub use loader::ProviderLoader;
pub use openai::OpenAi;
pub use registry::{ProviderInfo, ProviderRegistry};
pub use traits::*;
