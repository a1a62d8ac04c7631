//! HTTP API module for health, evaluation and metrics endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, ConfigOverrides, EvaluateRequest};
pub use routes::create_router;
