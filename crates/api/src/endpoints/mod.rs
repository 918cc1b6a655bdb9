//! API endpoints.

mod admin;
mod health;
mod ngo;
mod reports;

use axum::Router;

use crate::middleware::AppState;

pub use health::router as health_router;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/reports", reports::router())
        .nest("/ngo", ngo::router())
        .nest("/admin", admin::router())
}
