//! Web server module
//!
//! Provides the JSON and server-sent events API for AISEO-RS.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
