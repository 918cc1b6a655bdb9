//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use pawlink_common::AppError;
use pawlink_core::Actor;

/// Authenticated caller, NGO or admin.
///
/// Role checks happen in the services, which receive the [`Actor`] itself.
#[derive(Debug, Clone)]
pub struct AuthActor(pub Actor);

impl<S> FromRequestParts<S> for AuthActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(AuthActor)
            .ok_or(AppError::Unauthorized)
    }
}
