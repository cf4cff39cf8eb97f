pub mod context;
pub mod health;

use axum::{middleware::from_fn, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::ScopeStore;
use crate::middleware::managed_context_middleware;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScopeStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ScopeStore>) -> Self {
        Self { store }
    }
}

/// Application router. Routes under `/api` expect a `ScopeUser` extension from the
/// authentication layer in front of this router.
pub fn app(state: AppState) -> Router {
    let scoped = Router::new()
        .route("/api/context", get(context::context_get))
        .layer(from_fn(managed_context_middleware));

    Router::new()
        .route("/health", get(health::health))
        .merge(scoped)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
