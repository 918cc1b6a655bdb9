//! HTTP API layer for pawlink.
//!
//! - **Endpoints**: report intake, NGO accounts and dispatch, admin oversight
//! - **Extractors**: the authenticated [`pawlink_core::Actor`]
//! - **Middleware**: bearer-token authentication and shared state
//!
//! Built on Axum 0.8. Transport layers (tracing, CORS, timeouts) are added by
//! the server binary.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::AppState;

/// Full application: `/health` plus the API under `/api`, behind token auth.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(endpoints::health_router())
        .nest("/api", router())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}
