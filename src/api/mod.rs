//! API module
//!
//! HTTP API endpoints, middleware and shared application state.

pub mod extract;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{PasswordService, TokenService};
use crate::store::Storage;

pub use routes::create_router;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub passwords: Arc<PasswordService>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, passwords: PasswordService, tokens: TokenService) -> Self {
        Self {
            store,
            passwords: Arc::new(passwords),
            tokens: Arc::new(tokens),
        }
    }
}

/// Full application: routes, gates and the request-tracing stack
pub fn build_app(state: AppState) -> Router {
    // ServiceBuilder runs top to bottom: request id -> trace -> context -> logging -> routes
    let request_stack = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::context_middleware))
        .layer(axum::middleware::from_fn(middleware::logging_middleware));

    create_router(state.clone())
        .route("/health", axum::routing::get(health_check))
        .layer(request_stack)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
