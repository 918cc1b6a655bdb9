//! Dispatch coordinator: routes reports to nearby NGOs and applies their actions.
//!
//! A report leaves `Active` exactly once. The store performs the transition as
//! a compare-and-set, so of several concurrent accept/flag calls on the same
//! report one wins and the others see `Conflict`. Accepting credits the rescue
//! in the same step.

use std::cmp::Ordering;

use chrono::Utc;
use pawlink_common::{AppError, AppResult};
use pawlink_db::{
    entities::{
        ngo_profile::{self, NgoStatus},
        report::{self, ReportStatus},
    },
    repositories::{NgoFilter, ReportFilter, ReportTransition, SharedNgoStore, SharedReportStore},
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::animal::AnimalKind;
use super::geo::{GeoMatcher, GeoPoint};
use super::ngo_registry::NgoRegistry;
use crate::Actor;

/// An active report near an NGO.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyReport {
    pub report: report::Model,
    pub distance_km: f64,
}

/// Dispatch coordinator service.
#[derive(Clone)]
pub struct DispatchCoordinator {
    reports: SharedReportStore,
    ngos: SharedNgoStore,
    registry: NgoRegistry,
    matcher: GeoMatcher,
}

fn report_location(report: &report::Model) -> GeoPoint {
    GeoPoint::new(report.latitude, report.longitude)
}

fn ngo_location(ngo: &ngo_profile::Model) -> GeoPoint {
    GeoPoint::new(ngo.latitude, ngo.longitude)
}

/// An unclassified report matches every NGO, and an NGO taking "other" matches every report.
fn handles_animal(ngo: &ngo_profile::Model, kind: AnimalKind) -> bool {
    kind == AnimalKind::Other
        || ngo.has_capability(AnimalKind::Other.as_str())
        || ngo.has_capability(kind.as_str())
}

/// Nearest first, ties broken by id.
fn by_distance_then_id(a: (f64, &str), b: (f64, &str)) -> Ordering {
    a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1))
}

impl DispatchCoordinator {
    /// Create a new dispatch coordinator.
    #[must_use]
    pub const fn new(
        reports: SharedReportStore,
        ngos: SharedNgoStore,
        registry: NgoRegistry,
        matcher: GeoMatcher,
    ) -> Self {
        Self {
            reports,
            ngos,
            registry,
            matcher,
        }
    }

    /// Distance to the report if the NGO's capabilities and location cover it.
    ///
    /// Approval status is not considered.
    #[must_use]
    pub fn coverage(&self, report: &report::Model, ngo: &ngo_profile::Model) -> Option<f64> {
        if !handles_animal(ngo, AnimalKind::classify(&report.animal_type)) {
            return None;
        }
        self.matcher
            .distance_within(report_location(report), ngo_location(ngo))
    }

    /// Approved NGOs that may act on the report, nearest first.
    ///
    /// Empty once the report has left `Active`.
    pub async fn eligible_ngos(
        &self,
        report: &report::Model,
    ) -> AppResult<Vec<ngo_profile::Model>> {
        if report.status != ReportStatus::Active {
            return Ok(Vec::new());
        }

        let approved = self
            .ngos
            .list(&NgoFilter {
                status: Some(NgoStatus::Approved),
                ..NgoFilter::default()
            })
            .await?;

        let mut ranked: Vec<(f64, ngo_profile::Model)> = approved
            .into_iter()
            .filter_map(|ngo| self.coverage(report, &ngo).map(|d| (d, ngo)))
            .collect();
        ranked.sort_by(|a, b| by_distance_then_id((a.0, &a.1.id), (b.0, &b.1.id)));

        debug!(report_id = %report.id, eligible = ranked.len(), "Computed eligible NGOs");
        Ok(ranked.into_iter().map(|(_, ngo)| ngo).collect())
    }

    /// Active reports the NGO covers, nearest first.
    ///
    /// Available to the NGO itself, whatever its approval status, and to admins.
    pub async fn reports_for_ngo(
        &self,
        actor: &Actor,
        ngo_id: &str,
    ) -> AppResult<Vec<NearbyReport>> {
        if !actor.is_admin() && actor.id() != ngo_id {
            return Err(AppError::Forbidden(
                "Cannot view another NGO's reports".to_string(),
            ));
        }

        let ngo = self.ngos.get_by_id(ngo_id).await?;
        let active = self.reports.list(&ReportFilter::active()).await?;

        let mut nearby: Vec<NearbyReport> = active
            .into_iter()
            .filter_map(|report| {
                self.coverage(&report, &ngo).map(|distance_km| NearbyReport {
                    report,
                    distance_km,
                })
            })
            .collect();
        nearby.sort_by(|a, b| {
            by_distance_then_id((a.distance_km, &a.report.id), (b.distance_km, &b.report.id))
        });

        Ok(nearby)
    }

    /// Accept a report: it becomes `Closed` and the NGO is credited one rescue.
    pub async fn accept(&self, actor: &Actor, report_id: &str) -> AppResult<report::Model> {
        let ngo_id = actor.ngo_id()?;
        self.ensure_may_act(report_id, ngo_id).await?;

        let transition = ReportTransition {
            to: ReportStatus::Closed,
            actor_id: ngo_id.to_string(),
            at: Utc::now(),
            credit_rescue_to: Some(ngo_id.to_string()),
            require_approved: Some(ngo_id.to_string()),
        };
        let report = self.apply(report_id, &transition).await?;
        info!(report_id = %report_id, ngo_id = %ngo_id, "Report accepted");

        // The acceptance is committed; a stale rating must not turn it into an error.
        if let Err(e) = self.registry.refresh_rating(ngo_id).await {
            warn!(ngo_id = %ngo_id, error = %e, "Rating refresh failed");
        }
        Ok(report)
    }

    /// Flag a report: it becomes `Flagged`. No rescue is credited.
    pub async fn flag(&self, actor: &Actor, report_id: &str) -> AppResult<report::Model> {
        let ngo_id = actor.ngo_id()?;
        self.ensure_may_act(report_id, ngo_id).await?;

        let transition = ReportTransition {
            to: ReportStatus::Flagged,
            actor_id: ngo_id.to_string(),
            at: Utc::now(),
            credit_rescue_to: None,
            require_approved: Some(ngo_id.to_string()),
        };
        let report = self.apply(report_id, &transition).await?;

        info!(report_id = %report_id, ngo_id = %ngo_id, "Report flagged");
        Ok(report)
    }

    /// Apply an NGO's chosen outcome (`Closed` accepts, `Flagged` flags).
    pub async fn act(
        &self,
        actor: &Actor,
        report_id: &str,
        status: ReportStatus,
    ) -> AppResult<report::Model> {
        match status {
            ReportStatus::Closed => self.accept(actor, report_id).await,
            ReportStatus::Flagged => self.flag(actor, report_id).await,
            ReportStatus::Active => Err(AppError::Validation(
                "Reopening reports is not supported".to_string(),
            )),
        }
    }

    /// Force an `Active` report into a terminal state, bypassing eligibility.
    ///
    /// The admin is recorded as the actor and no rescue is credited.
    pub async fn admin_override(
        &self,
        actor: &Actor,
        report_id: &str,
        status: ReportStatus,
    ) -> AppResult<report::Model> {
        let admin_id = actor.admin_id()?;
        if !status.is_terminal() {
            return Err(AppError::Validation(
                "Reopening reports is not supported".to_string(),
            ));
        }

        let transition = ReportTransition {
            to: status,
            actor_id: admin_id.to_string(),
            at: Utc::now(),
            credit_rescue_to: None,
            require_approved: None,
        };
        let report = self.apply(report_id, &transition).await?;

        info!(
            report_id = %report_id,
            admin_id = %admin_id,
            status = status.as_str(),
            "Report status overridden"
        );
        Ok(report)
    }

    /// Checks, in order: both exist, the report is still active, the NGO is
    /// approved and covers the report.
    async fn ensure_may_act(&self, report_id: &str, ngo_id: &str) -> AppResult<()> {
        let report = self.reports.get_by_id(report_id).await?;
        let ngo = self.ngos.get_by_id(ngo_id).await?;

        if report.status != ReportStatus::Active {
            return Err(AppError::Conflict(format!(
                "Report {report_id} is already {}",
                report.status.as_str()
            )));
        }
        if !ngo.is_approved() {
            return Err(AppError::Forbidden(format!(
                "NGO is {} and cannot act on reports",
                ngo.status.as_str()
            )));
        }
        if self.coverage(&report, &ngo).is_none() {
            return Err(AppError::Forbidden(
                "NGO is not eligible for this report".to_string(),
            ));
        }
        Ok(())
    }

    async fn apply(
        &self,
        report_id: &str,
        transition: &ReportTransition,
    ) -> AppResult<report::Model> {
        self.reports
            .transition(report_id, transition)
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::Conflict(_)) {
                    warn!(
                        report_id = %report_id,
                        actor_id = %transition.actor_id,
                        "Lost race for report"
                    );
                }
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::fixtures::{ORIGIN, ngo_at, north_of_origin, report_at, seed_ngo, seed_report};
    use crate::services::ngo_registry::RatingPolicy;
    use async_trait::async_trait;
    use chrono::DateTime;
    use pawlink_db::{
        MemoryStore,
        repositories::{NgoCounts, NgoStore, ProfileSetup},
    };
    use std::sync::Arc;

    fn coordinator(store: &MemoryStore) -> DispatchCoordinator {
        let registry = NgoRegistry::new(Arc::new(store.clone()));
        DispatchCoordinator::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            registry,
            GeoMatcher::new(25.0),
        )
    }

    fn ngo(id: &str) -> Actor {
        Actor::Ngo { id: id.into() }
    }

    fn admin() -> Actor {
        Actor::Admin { id: "admin1".into() }
    }

    #[tokio::test]
    async fn test_eligible_ngos_filters_capability() {
        let store = MemoryStore::new();
        let report = seed_report(&store, report_at("r1", "Cat", ORIGIN)).await;
        seed_ngo(
            &store,
            ngo_at("a", NgoStatus::Approved, &["cats", "dogs"], north_of_origin(2.0)),
        )
        .await;
        seed_ngo(
            &store,
            ngo_at("b", NgoStatus::Approved, &["wildlife"], north_of_origin(1.0)),
        )
        .await;

        let eligible = coordinator(&store).eligible_ngos(&report).await.unwrap();
        let ids: Vec<&str> = eligible.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["a"]);
    }

    #[tokio::test]
    async fn test_eligible_ngos_order_status_and_radius() {
        let store = MemoryStore::new();
        let report = seed_report(&store, report_at("r1", "dog", ORIGIN)).await;
        seed_ngo(&store, ngo_at("far", NgoStatus::Approved, &["dogs"], north_of_origin(10.0))).await;
        seed_ngo(&store, ngo_at("z-near", NgoStatus::Approved, &["dogs"], north_of_origin(3.0))).await;
        seed_ngo(&store, ngo_at("a-near", NgoStatus::Approved, &["dogs"], north_of_origin(3.0))).await;
        seed_ngo(&store, ngo_at("out", NgoStatus::Approved, &["dogs"], north_of_origin(40.0))).await;
        seed_ngo(&store, ngo_at("pending", NgoStatus::PendingApproval, &["dogs"], ORIGIN)).await;
        seed_ngo(&store, ngo_at("suspended", NgoStatus::Suspended, &["dogs"], ORIGIN)).await;
        seed_ngo(&store, ngo_at("nowhere", NgoStatus::Approved, &["dogs"], GeoPoint::new(0.0, 0.0))).await;

        let eligible = coordinator(&store).eligible_ngos(&report).await.unwrap();
        let ids: Vec<&str> = eligible.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["a-near", "z-near", "far"]);
    }

    #[tokio::test]
    async fn test_other_matches_both_ways() {
        let store = MemoryStore::new();
        let odd = seed_report(&store, report_at("r1", "pangolin", ORIGIN)).await;
        let cat = seed_report(&store, report_at("r2", "cat", ORIGIN)).await;
        seed_ngo(&store, ngo_at("birds", NgoStatus::Approved, &["birds"], ORIGIN)).await;
        seed_ngo(&store, ngo_at("any", NgoStatus::Approved, &["other"], ORIGIN)).await;

        let coordinator = coordinator(&store);
        assert_eq!(coordinator.eligible_ngos(&odd).await.unwrap().len(), 2);

        let for_cat = coordinator.eligible_ngos(&cat).await.unwrap();
        assert_eq!(for_cat.len(), 1);
        assert_eq!(for_cat[0].id, "any");
    }

    #[tokio::test]
    async fn test_accept_then_flag_conflicts() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("r1", "Cat", ORIGIN)).await;
        seed_ngo(&store, ngo_at("a", NgoStatus::Approved, &["cats"], north_of_origin(2.0))).await;
        seed_ngo(&store, ngo_at("b", NgoStatus::Approved, &["wildlife"], north_of_origin(1.0))).await;
        let coordinator = coordinator(&store);

        let closed = coordinator.accept(&ngo("a"), "r1").await.unwrap();
        assert_eq!(closed.status, ReportStatus::Closed);
        assert_eq!(closed.closed_by.as_deref(), Some("a"));
        assert!(closed.closed_at.is_some());
        assert!(closed.stamps_consistent());

        let flagged = coordinator.flag(&ngo("b"), "r1").await;
        assert!(matches!(flagged, Err(AppError::Conflict(_))));

        let credited = NgoStore::get_by_id(&store, "a").await.unwrap();
        assert_eq!(credited.total_rescues, 1);
        assert!(coordinator.eligible_ngos(&closed).await.unwrap().is_empty());
    }

    /// Delegates to the memory store but cannot write ratings.
    struct RatingWriteFails(MemoryStore);

    #[async_trait]
    impl NgoStore for RatingWriteFails {
        async fn create(&self, model: ngo_profile::Model) -> AppResult<ngo_profile::Model> {
            NgoStore::create(&self.0, model).await
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<ngo_profile::Model>> {
            NgoStore::find_by_id(&self.0, id).await
        }

        async fn find_by_email(&self, email: &str) -> AppResult<Option<ngo_profile::Model>> {
            self.0.find_by_email(email).await
        }

        async fn find_by_token(&self, token: &str) -> AppResult<Option<ngo_profile::Model>> {
            NgoStore::find_by_token(&self.0, token).await
        }

        async fn list(&self, filter: &NgoFilter) -> AppResult<Vec<ngo_profile::Model>> {
            NgoStore::list(&self.0, filter).await
        }

        async fn update_setup(
            &self,
            id: &str,
            setup: &ProfileSetup,
        ) -> AppResult<ngo_profile::Model> {
            self.0.update_setup(id, setup).await
        }

        async fn update_status(
            &self,
            id: &str,
            status: NgoStatus,
            at: DateTime<Utc>,
        ) -> AppResult<ngo_profile::Model> {
            self.0.update_status(id, status, at).await
        }

        async fn increment_rescues(&self, id: &str) -> AppResult<ngo_profile::Model> {
            self.0.increment_rescues(id).await
        }

        async fn update_rating(&self, _id: &str, _rating: f64) -> AppResult<ngo_profile::Model> {
            Err(AppError::Database("connection reset".to_string()))
        }

        async fn count_by_status(&self) -> AppResult<NgoCounts> {
            NgoStore::count_by_status(&self.0).await
        }
    }

    struct OnePerRescue;

    impl RatingPolicy for OnePerRescue {
        fn rating(&self, profile: &ngo_profile::Model) -> f64 {
            f64::from(profile.total_rescues) + 1.0
        }
    }

    #[tokio::test]
    async fn test_accept_succeeds_when_rating_write_fails() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("r1", "Cat", ORIGIN)).await;
        seed_ngo(&store, ngo_at("a", NgoStatus::Approved, &["cats"], ORIGIN)).await;

        let ngos: SharedNgoStore = Arc::new(RatingWriteFails(store.clone()));
        let registry =
            NgoRegistry::new(Arc::clone(&ngos)).with_rating_policy(Arc::new(OnePerRescue));
        let coordinator = DispatchCoordinator::new(
            Arc::new(store.clone()),
            ngos,
            registry,
            GeoMatcher::new(25.0),
        );

        let closed = coordinator.accept(&ngo("a"), "r1").await.unwrap();
        assert_eq!(closed.status, ReportStatus::Closed);
        assert_eq!(closed.closed_by.as_deref(), Some("a"));

        let credited = NgoStore::get_by_id(&store, "a").await.unwrap();
        assert_eq!(credited.total_rescues, 1);
        assert_eq!(credited.rating, 0.0);
    }

    #[tokio::test]
    async fn test_flag_records_flagger_without_credit() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("r1", "Dog", ORIGIN)).await;
        seed_ngo(&store, ngo_at("a", NgoStatus::Approved, &["dogs"], ORIGIN)).await;

        let flagged = coordinator(&store).flag(&ngo("a"), "r1").await.unwrap();
        assert_eq!(flagged.status, ReportStatus::Flagged);
        assert_eq!(flagged.flagged_by.as_deref(), Some("a"));
        assert!(flagged.closed_by.is_none());

        let ngo = NgoStore::get_by_id(&store, "a").await.unwrap();
        assert_eq!(ngo.total_rescues, 0);
    }

    #[tokio::test]
    async fn test_pending_ngo_cannot_accept() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("r1", "Dog", ORIGIN)).await;
        seed_ngo(&store, ngo_at("p", NgoStatus::PendingApproval, &["dogs"], ORIGIN)).await;

        let result = coordinator(&store).accept(&ngo("p"), "r1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_ineligible_ngo_forbidden() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("r1", "Dog", ORIGIN)).await;
        seed_ngo(&store, ngo_at("cats", NgoStatus::Approved, &["cats"], ORIGIN)).await;
        seed_ngo(&store, ngo_at("far", NgoStatus::Approved, &["dogs"], north_of_origin(80.0))).await;
        let coordinator = coordinator(&store);

        assert!(matches!(
            coordinator.accept(&ngo("cats"), "r1").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            coordinator.flag(&ngo("far"), "r1").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_ids_and_wrong_role() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("r1", "Dog", ORIGIN)).await;
        seed_ngo(&store, ngo_at("a", NgoStatus::Approved, &["dogs"], ORIGIN)).await;
        let coordinator = coordinator(&store);

        assert!(matches!(
            coordinator.accept(&ngo("a"), "missing").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            coordinator.accept(&ngo("ghost"), "r1").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            coordinator.accept(&admin(), "r1").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_act_rejects_reopen() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("r1", "Dog", ORIGIN)).await;
        seed_ngo(&store, ngo_at("a", NgoStatus::Approved, &["dogs"], ORIGIN)).await;

        let result = coordinator(&store)
            .act(&ngo("a"), "r1", ReportStatus::Active)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_admin_override() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("r1", "Dog", ORIGIN)).await;
        let coordinator = coordinator(&store);

        let flagged = coordinator
            .admin_override(&admin(), "r1", ReportStatus::Flagged)
            .await
            .unwrap();
        assert_eq!(flagged.flagged_by.as_deref(), Some("admin1"));

        let again = coordinator
            .admin_override(&admin(), "r1", ReportStatus::Closed)
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let reopen = coordinator
            .admin_override(&admin(), "r1", ReportStatus::Active)
            .await;
        assert!(matches!(reopen, Err(AppError::Validation(_))));

        let as_ngo = coordinator
            .admin_override(&ngo("a"), "r1", ReportStatus::Closed)
            .await;
        assert!(matches!(as_ngo, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_reports_for_ngo() {
        let store = MemoryStore::new();
        seed_report(&store, report_at("far", "dog", north_of_origin(9.0))).await;
        seed_report(&store, report_at("near", "dog", north_of_origin(1.0))).await;
        seed_report(&store, report_at("cat", "cat", ORIGIN)).await;
        seed_report(&store, report_at("away", "dog", north_of_origin(60.0))).await;
        let mut done = report_at("done", "dog", ORIGIN);
        done.status = ReportStatus::Closed;
        done.closed_by = Some("x".to_string());
        done.closed_at = Some(Utc::now().into());
        seed_report(&store, done).await;
        // Pending NGOs may look but not act
        seed_ngo(&store, ngo_at("p", NgoStatus::PendingApproval, &["dogs"], ORIGIN)).await;
        let coordinator = coordinator(&store);

        let nearby = coordinator.reports_for_ngo(&ngo("p"), "p").await.unwrap();
        let ids: Vec<&str> = nearby.iter().map(|n| n.report.id.as_str()).collect();
        assert_eq!(ids, ["near", "far"]);
        assert!(nearby[0].distance_km < nearby[1].distance_km);

        assert!(matches!(
            coordinator.reports_for_ngo(&ngo("q"), "p").await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(
            coordinator.reports_for_ngo(&admin(), "p").await.unwrap().len(),
            2
        );
    }
}
