//! Admin oversight: listings, NGO approval, report removal and platform stats.

use chrono::Utc;
use pawlink_common::{AppError, AppResult, IdGenerator};
use pawlink_db::{
    entities::{admin_account, ngo_profile, ngo_profile::NgoStatus, report},
    repositories::{NgoFilter, ReportFilter, SharedAdminStore, SharedNgoStore, SharedReportStore},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::ngo_registry::NgoRegistry;
use super::password::{hash_password, verify_password};
use crate::Actor;

/// Admin oversight service.
#[derive(Clone)]
pub struct AdminService {
    reports: SharedReportStore,
    ngos: SharedNgoStore,
    admins: SharedAdminStore,
    registry: NgoRegistry,
    id_gen: IdGenerator,
}

/// Input for creating an admin account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAdminInput {
    #[validate(length(min = 3, max = 64))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// An authenticated admin with its API token.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin: admin_account::Model,
    pub token: String,
}

/// Platform-wide counts, recomputed on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub ngo_pending: u64,
    pub ngo_approved: u64,
    pub ngo_suspended: u64,
    pub reports_active: u64,
    pub reports_closed: u64,
    pub reports_flagged: u64,
}

impl AdminService {
    /// Create a new admin service.
    #[must_use]
    pub const fn new(
        reports: SharedReportStore,
        ngos: SharedNgoStore,
        admins: SharedAdminStore,
        registry: NgoRegistry,
    ) -> Self {
        Self {
            reports,
            ngos,
            admins,
            registry,
            id_gen: IdGenerator::new(),
        }
    }

    /// List NGOs for review.
    pub async fn list_ngos(
        &self,
        actor: &Actor,
        filter: &NgoFilter,
    ) -> AppResult<Vec<ngo_profile::Model>> {
        actor.admin_id()?;
        self.registry.find(filter).await
    }

    /// List reports of any status.
    pub async fn list_reports(
        &self,
        actor: &Actor,
        filter: &ReportFilter,
    ) -> AppResult<Vec<report::Model>> {
        actor.admin_id()?;
        self.reports.list(filter).await
    }

    /// Approve, suspend or reinstate an NGO.
    pub async fn set_ngo_status(
        &self,
        actor: &Actor,
        ngo_id: &str,
        status: NgoStatus,
    ) -> AppResult<ngo_profile::Model> {
        self.registry.set_status(actor, ngo_id, status).await
    }

    /// Permanently remove a report, whatever its state.
    pub async fn delete_report(&self, actor: &Actor, report_id: &str) -> AppResult<()> {
        let admin_id = actor.admin_id()?;
        self.reports.delete(report_id).await?;

        warn!(report_id = %report_id, admin_id = %admin_id, "Report deleted");
        Ok(())
    }

    /// Count NGOs and reports per status.
    pub async fn compute_stats(&self, actor: &Actor) -> AppResult<PlatformStats> {
        actor.admin_id()?;

        let ngos = self.ngos.count_by_status().await?;
        let reports = self.reports.count_by_status().await?;

        Ok(PlatformStats {
            ngo_pending: ngos.pending,
            ngo_approved: ngos.approved,
            ngo_suspended: ngos.suspended,
            reports_active: reports.active,
            reports_closed: reports.closed,
            reports_flagged: reports.flagged,
        })
    }

    /// Create an admin account. Used to bootstrap a deployment.
    pub async fn create_admin(&self, input: CreateAdminInput) -> AppResult<admin_account::Model> {
        input.validate()?;

        let username = input.username.trim().to_lowercase();
        if self.admins.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Admin {username} already exists"
            )));
        }

        let model = admin_account::Model {
            id: self.id_gen.generate(),
            username,
            password: hash_password(&input.password)?,
            token: Some(self.id_gen.generate_token()),
            created_at: Utc::now().into(),
        };

        let admin = self.admins.create(model).await?;
        info!(admin_id = %admin.id, username = %admin.username, "Admin account created");
        Ok(admin)
    }

    /// Authenticate an admin by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<AdminSession> {
        let admin = self
            .admins
            .find_by_username(&username.trim().to_lowercase())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &admin.password)? {
            return Err(AppError::Unauthorized);
        }
        let token = admin.token.clone().ok_or(AppError::Unauthorized)?;

        Ok(AdminSession { admin, token })
    }

    /// Resolve an API token to its admin.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<admin_account::Model>> {
        self.admins.find_by_token(token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::dispatch::DispatchCoordinator;
    use crate::services::fixtures::{ORIGIN, ngo_at, report_at, seed_ngo, seed_report};
    use crate::services::geo::GeoMatcher;
    use pawlink_db::{MemoryStore, entities::report::ReportStatus};
    use std::sync::Arc;

    fn service(store: &MemoryStore) -> AdminService {
        AdminService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            NgoRegistry::new(Arc::new(store.clone())),
        )
    }

    fn admin() -> Actor {
        Actor::Admin { id: "admin1".into() }
    }

    #[tokio::test]
    async fn test_compute_stats() {
        let store = MemoryStore::new();
        seed_ngo(&store, ngo_at("n1", NgoStatus::Approved, &["dogs"], ORIGIN)).await;
        seed_ngo(&store, ngo_at("n2", NgoStatus::PendingApproval, &["dogs"], ORIGIN)).await;
        seed_ngo(&store, ngo_at("n3", NgoStatus::PendingApproval, &["cats"], ORIGIN)).await;
        seed_report(&store, report_at("r1", "dog", ORIGIN)).await;
        seed_report(&store, report_at("r2", "dog", ORIGIN)).await;

        let registry = NgoRegistry::new(Arc::new(store.clone()));
        let dispatch = DispatchCoordinator::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            registry,
            GeoMatcher::default(),
        );
        dispatch
            .accept(&Actor::Ngo { id: "n1".into() }, "r1")
            .await
            .unwrap();

        let stats = service(&store).compute_stats(&admin()).await.unwrap();
        assert_eq!(
            stats,
            PlatformStats {
                ngo_pending: 2,
                ngo_approved: 1,
                ngo_suspended: 0,
                reports_active: 1,
                reports_closed: 1,
                reports_flagged: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_delete_report() {
        let store = MemoryStore::new();
        let mut flagged = report_at("r1", "dog", ORIGIN);
        flagged.status = ReportStatus::Flagged;
        flagged.flagged_by = Some("n1".to_string());
        flagged.flagged_at = Some(Utc::now().into());
        seed_report(&store, flagged).await;
        let service = service(&store);

        service.delete_report(&admin(), "r1").await.unwrap();
        assert!(matches!(
            service.delete_report(&admin(), "r1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_oversight_requires_admin() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("r1", "dog", ORIGIN)).await;
        let service = service(&store);
        let ngo = Actor::Ngo { id: "n1".into() };

        assert!(matches!(
            service.delete_report(&ngo, "r1").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.compute_stats(&ngo).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.list_reports(&ngo, &ReportFilter::default()).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_list_reports_search() {
        let store = MemoryStore::new();
        let mut on_road = report_at("r1", "Dog", ORIGIN);
        on_road.address = "Old Airport Road".to_string();
        seed_report(&store, on_road).await;
        seed_report(&store, report_at("r2", "Cat", ORIGIN)).await;

        let filter = ReportFilter {
            search: Some("airport".to_string()),
            ..ReportFilter::default()
        };
        let found = service(&store).list_reports(&admin(), &filter).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "r1");
    }

    #[tokio::test]
    async fn test_create_and_authenticate_admin() {
        let store = MemoryStore::new();
        let service = service(&store);

        let admin = service
            .create_admin(CreateAdminInput {
                username: "Root".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(admin.username, "root");

        let session = service.authenticate("ROOT", "hunter2hunter2").await.unwrap();
        assert_eq!(session.admin.id, admin.id);
        assert_eq!(
            service.find_by_token(&session.token).await.unwrap().map(|a| a.id),
            Some(admin.id)
        );

        assert!(matches!(
            service.authenticate("root", "wrong-password").await,
            Err(AppError::Unauthorized)
        ));

        let duplicate = service
            .create_admin(CreateAdminInput {
                username: "root".to_string(),
                password: "another-password".to_string(),
            })
            .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }
}
