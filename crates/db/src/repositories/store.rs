//! Storage abstractions for reports, NGO profiles and admin accounts.
//!
//! Services depend only on these traits. [`crate::repositories::ReportRepository`]
//! and friends implement them over Postgres; [`crate::memory::MemoryStore`]
//! implements all three in memory for tests and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pawlink_common::{AppError, AppResult};

use crate::entities::{
    admin_account,
    ngo_profile::{self, NgoStatus},
    report::{self, ReportStatus},
};

/// Shared handle to a report store.
pub type SharedReportStore = Arc<dyn ReportStore>;
/// Shared handle to an NGO store.
pub type SharedNgoStore = Arc<dyn NgoStore>;
/// Shared handle to an admin store.
pub type SharedAdminStore = Arc<dyn AdminStore>;

/// Report listing filter. All set fields must match.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    /// Case-insensitive substring of animal type or address.
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: u64,
}

impl ReportFilter {
    /// Filter matching only active reports.
    #[must_use]
    pub fn active() -> Self {
        Self {
            status: Some(ReportStatus::Active),
            ..Self::default()
        }
    }

    /// Whether a report satisfies the status and search terms.
    #[must_use]
    pub fn matches(&self, report: &report::Model) -> bool {
        if self.status.is_some_and(|s| s != report.status) {
            return false;
        }
        match normalized_search(self.search.as_deref()) {
            Some(needle) => {
                report.animal_type.to_lowercase().contains(&needle)
                    || report.address.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// NGO listing filter. All set fields must match.
#[derive(Debug, Clone, Default)]
pub struct NgoFilter {
    pub status: Option<NgoStatus>,
    /// Capability id, e.g. `"cats"`.
    pub capability: Option<String>,
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
}

impl NgoFilter {
    /// Whether a profile satisfies every set term.
    #[must_use]
    pub fn matches(&self, profile: &ngo_profile::Model) -> bool {
        if self.status.is_some_and(|s| s != profile.status) {
            return false;
        }
        if let Some(capability) = &self.capability
            && !profile.has_capability(capability)
        {
            return false;
        }
        match normalized_search(self.search.as_deref()) {
            Some(needle) => {
                profile.name.to_lowercase().contains(&needle)
                    || profile.email.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// Lower-cased, trimmed search term, or `None` when blank.
#[must_use]
pub fn normalized_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// A transition out of `Active`.
#[derive(Debug, Clone)]
pub struct ReportTransition {
    /// Target state; must be terminal.
    pub to: ReportStatus,
    /// Who performed it (NGO or admin id).
    pub actor_id: String,
    pub at: DateTime<Utc>,
    /// NGO whose rescue counter is incremented together with the transition.
    pub credit_rescue_to: Option<String>,
    /// NGO that must still be `Approved` when the transition commits.
    pub require_approved: Option<String>,
}

impl ReportTransition {
    /// Rejects non-terminal targets.
    pub fn ensure_terminal(&self) -> AppResult<()> {
        if self.to.is_terminal() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Cannot transition a report to {}",
                self.to.as_str()
            )))
        }
    }
}

/// Fails with `Forbidden` unless the NGO may act on reports.
pub fn ensure_approved(profile: &ngo_profile::Model) -> AppResult<()> {
    if profile.is_approved() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "NGO is {} and cannot act on reports",
            profile.status.as_str()
        )))
    }
}

/// Setup fields written when an NGO completes its profile.
#[derive(Debug, Clone)]
pub struct ProfileSetup {
    pub name: String,
    pub description: Option<String>,
    pub animals: Vec<String>,
    pub transport: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
}

/// Report counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportCounts {
    pub active: u64,
    pub closed: u64,
    pub flagged: u64,
}

/// NGO counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NgoCounts {
    pub pending: u64,
    pub approved: u64,
    pub suspended: u64,
}

/// Report persistence.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a new report.
    async fn create(&self, model: report::Model) -> AppResult<report::Model>;

    /// Find a report by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>>;

    /// Find a report by ID, returning an error if not found.
    async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))
    }

    /// List reports, newest first.
    async fn list(&self, filter: &ReportFilter) -> AppResult<Vec<report::Model>>;

    /// Move an `Active` report to a terminal state as one indivisible step.
    ///
    /// Fails with `NotFound` for an unknown report or NGO, with `Conflict` if
    /// the report is no longer `Active` and with `Forbidden` if the NGO named
    /// in `require_approved` is not approved. On failure nothing is written.
    async fn transition(
        &self,
        id: &str,
        transition: &ReportTransition,
    ) -> AppResult<report::Model>;

    /// Remove a report regardless of its state.
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Count reports per status.
    async fn count_by_status(&self) -> AppResult<ReportCounts>;
}

/// NGO profile persistence.
#[async_trait]
pub trait NgoStore: Send + Sync {
    /// Insert a new profile. Fails with `Conflict` on a duplicate email.
    async fn create(&self, model: ngo_profile::Model) -> AppResult<ngo_profile::Model>;

    /// Find a profile by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<ngo_profile::Model>>;

    /// Find a profile by ID, returning an error if not found.
    async fn get_by_id(&self, id: &str) -> AppResult<ngo_profile::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("NGO {id} not found")))
    }

    /// Find a profile by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<ngo_profile::Model>>;

    /// Find a profile by access token.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<ngo_profile::Model>>;

    /// List profiles, most recently registered first.
    async fn list(&self, filter: &NgoFilter) -> AppResult<Vec<ngo_profile::Model>>;

    /// Write setup fields and mark the profile complete.
    async fn update_setup(&self, id: &str, setup: &ProfileSetup)
    -> AppResult<ngo_profile::Model>;

    /// Set the approval status. `approved_at` is stamped on first approval.
    async fn update_status(
        &self,
        id: &str,
        status: NgoStatus,
        at: DateTime<Utc>,
    ) -> AppResult<ngo_profile::Model>;

    /// Atomically add one rescue.
    async fn increment_rescues(&self, id: &str) -> AppResult<ngo_profile::Model>;

    /// Overwrite the rating.
    async fn update_rating(&self, id: &str, rating: f64) -> AppResult<ngo_profile::Model>;

    /// Count profiles per status.
    async fn count_by_status(&self) -> AppResult<NgoCounts>;
}

/// Admin account persistence.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Insert a new admin. Fails with `Conflict` on a duplicate username.
    async fn create(&self, model: admin_account::Model) -> AppResult<admin_account::Model>;

    /// Find an admin by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<admin_account::Model>>;

    /// Find an admin by username (case-insensitive).
    async fn find_by_username(&self, username: &str)
    -> AppResult<Option<admin_account::Model>>;

    /// Find an admin by access token.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<admin_account::Model>>;
}
