//! CI Log Distiller HTTP service.
//!
//! JSON endpoints over the log-distiller engine. Bind to 127.0.0.1 by default
//! (internal only).

mod handlers;
mod state;
pub mod types;

use axum::{
  extract::DefaultBodyLimit,
  routing::{get, post},
  Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handlers::{compact, distill, health, outcomes, report, status_for};
pub use state::{AppState, RuntimeFetcher};

/// Routes for the service. `max_body_bytes` caps uploaded log size.
pub fn router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/distill/:block", post(distill))
    .route("/compact", post(compact))
    .route("/aggregate/outcomes", post(outcomes))
    .route("/aggregate/report", post(report))
    .layer(DefaultBodyLimit::max(max_body_bytes))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}
