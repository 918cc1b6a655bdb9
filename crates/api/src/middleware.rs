//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use pawlink_common::config::DispatchConfig;
use pawlink_core::{
    Actor, AdminService, DispatchCoordinator, GeoMatcher, NgoRegistry, ReportService,
};
use pawlink_db::repositories::{SharedAdminStore, SharedNgoStore, SharedReportStore};
use tracing::warn;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub report_service: ReportService,
    pub ngo_registry: NgoRegistry,
    pub dispatch: DispatchCoordinator,
    pub admin_service: AdminService,
}

impl AppState {
    /// Wire every service over the given stores.
    #[must_use]
    pub fn new(
        reports: SharedReportStore,
        ngos: SharedNgoStore,
        admins: SharedAdminStore,
        dispatch: &DispatchConfig,
    ) -> Self {
        let ngo_registry = NgoRegistry::new(ngos.clone());

        Self {
            report_service: ReportService::new(reports.clone()),
            dispatch: DispatchCoordinator::new(
                reports.clone(),
                ngos.clone(),
                ngo_registry.clone(),
                GeoMatcher::from_config(dispatch),
            ),
            admin_service: AdminService::new(reports, ngos, admins, ngo_registry.clone()),
            ngo_registry,
        }
    }

    /// Resolve an API token to the NGO or admin that owns it.
    async fn resolve_token(&self, token: &str) -> Option<Actor> {
        match self.ngo_registry.find_by_token(token).await {
            Ok(Some(ngo)) => return Some(Actor::Ngo { id: ngo.id }),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "NGO token lookup failed"),
        }

        match self.admin_service.find_by_token(token).await {
            Ok(admin) => admin.map(|a| Actor::Admin { id: a.id }),
            Err(e) => {
                warn!(error = %e, "Admin token lookup failed");
                None
            }
        }
    }
}

/// Authentication middleware.
///
/// Inserts the caller's [`Actor`] into request extensions when a valid
/// bearer token is present. Requests without one pass through anonymously.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Some(actor) = state.resolve_token(token.trim()).await
    {
        req.extensions_mut().insert(actor);
    }

    next.run(req).await
}
