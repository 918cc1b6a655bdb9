//! In-memory storage.
//!
//! Implements every store trait over one set of maps guarded by a single
//! lock, so a report transition and its rescue credit land together. Used by
//! tests and by embedders that do not need persistence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pawlink_common::{AppError, AppResult};
use tokio::sync::RwLock;

use crate::entities::{
    admin_account,
    ngo_profile::{self, NgoStatus},
    report::{self, ReportStatus},
};
use crate::repositories::{
    AdminStore, NgoCounts, NgoFilter, NgoStore, ProfileSetup, ReportCounts, ReportFilter,
    ReportStore, ReportTransition, ensure_approved,
};

#[derive(Debug, Default)]
struct State {
    reports: HashMap<String, report::Model>,
    profiles: HashMap<String, ngo_profile::Model>,
    admins: HashMap<String, admin_account::Model>,
}

/// In-memory store. Cloning shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all data.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.reports.clear();
        state.profiles.clear();
        state.admins.clear();
    }
}

fn profile_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("NGO {id} not found"))
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn create(&self, model: report::Model) -> AppResult<report::Model> {
        let mut state = self.state.write().await;
        if state.reports.contains_key(&model.id) {
            return Err(AppError::Conflict(format!("Report {} already exists", model.id)));
        }
        state.reports.insert(model.id.clone(), model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Ok(self.state.read().await.reports.get(id).cloned())
    }

    async fn list(&self, filter: &ReportFilter) -> AppResult<Vec<report::Model>> {
        let state = self.state.read().await;
        let mut reports: Vec<report::Model> = state
            .reports
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        reports.sort_by(|a, b| {
            b.reported_at
                .cmp(&a.reported_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let offset = usize::try_from(filter.offset).unwrap_or(usize::MAX);
        let limit = filter
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(reports.into_iter().skip(offset).take(limit).collect())
    }

    async fn transition(
        &self,
        id: &str,
        transition: &ReportTransition,
    ) -> AppResult<report::Model> {
        transition.ensure_terminal()?;

        // Check and write under one write guard
        let mut state = self.state.write().await;

        let current = state
            .reports
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;
        if current.status != ReportStatus::Active {
            return Err(AppError::Conflict(format!(
                "Report {id} is already {}",
                current.status.as_str()
            )));
        }
        if let Some(ngo_id) = &transition.require_approved {
            let profile = state
                .profiles
                .get(ngo_id)
                .ok_or_else(|| profile_not_found(ngo_id))?;
            ensure_approved(profile)?;
        }
        if let Some(ngo_id) = &transition.credit_rescue_to
            && !state.profiles.contains_key(ngo_id)
        {
            return Err(profile_not_found(ngo_id));
        }

        if let Some(ngo_id) = &transition.credit_rescue_to
            && let Some(profile) = state.profiles.get_mut(ngo_id)
        {
            profile.total_rescues = profile.total_rescues.saturating_add(1);
        }

        let report = state
            .reports
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;
        let at = Some(transition.at.into());
        report.status = transition.to;
        if transition.to == ReportStatus::Closed {
            report.closed_by = Some(transition.actor_id.clone());
            report.closed_at = at;
        } else {
            report.flagged_by = Some(transition.actor_id.clone());
            report.flagged_at = at;
        }

        Ok(report.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.state
            .write()
            .await
            .reports
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))
    }

    async fn count_by_status(&self) -> AppResult<ReportCounts> {
        let state = self.state.read().await;
        Ok(state
            .reports
            .values()
            .fold(ReportCounts::default(), |mut counts, r| {
                match r.status {
                    ReportStatus::Active => counts.active += 1,
                    ReportStatus::Closed => counts.closed += 1,
                    ReportStatus::Flagged => counts.flagged += 1,
                }
                counts
            }))
    }
}

#[async_trait]
impl NgoStore for MemoryStore {
    async fn create(&self, model: ngo_profile::Model) -> AppResult<ngo_profile::Model> {
        let mut state = self.state.write().await;
        let email_taken = state
            .profiles
            .values()
            .any(|p| p.email.eq_ignore_ascii_case(&model.email));
        if email_taken || state.profiles.contains_key(&model.id) {
            return Err(AppError::Conflict(
                "An NGO with this email already exists".to_string(),
            ));
        }
        state.profiles.insert(model.id.clone(), model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<ngo_profile::Model>> {
        Ok(self.state.read().await.profiles.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<ngo_profile::Model>> {
        let email = email.trim();
        Ok(self
            .state
            .read()
            .await
            .profiles
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ngo_profile::Model>> {
        Ok(self
            .state
            .read()
            .await
            .profiles
            .values()
            .find(|p| p.token.as_deref() == Some(token))
            .cloned())
    }

    async fn list(&self, filter: &NgoFilter) -> AppResult<Vec<ngo_profile::Model>> {
        let state = self.state.read().await;
        let mut profiles: Vec<ngo_profile::Model> = state
            .profiles
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        profiles.sort_by(|a, b| {
            b.registered_at
                .cmp(&a.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(profiles)
    }

    async fn update_setup(
        &self,
        id: &str,
        setup: &ProfileSetup,
    ) -> AppResult<ngo_profile::Model> {
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .get_mut(id)
            .ok_or_else(|| profile_not_found(id))?;

        profile.name = setup.name.clone();
        profile.description = setup.description.clone();
        profile.animals = serde_json::json!(setup.animals);
        profile.transport = setup.transport;
        profile.latitude = setup.latitude;
        profile.longitude = setup.longitude;
        profile.address = setup.address.clone();
        profile.contact_phone = setup.contact_phone.clone();
        profile.website = setup.website.clone();
        profile.profile_complete = true;

        Ok(profile.clone())
    }

    async fn update_status(
        &self,
        id: &str,
        status: NgoStatus,
        at: DateTime<Utc>,
    ) -> AppResult<ngo_profile::Model> {
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .get_mut(id)
            .ok_or_else(|| profile_not_found(id))?;

        if status == NgoStatus::Approved && profile.approved_at.is_none() {
            profile.approved_at = Some(at.into());
        }
        profile.status = status;

        Ok(profile.clone())
    }

    async fn increment_rescues(&self, id: &str) -> AppResult<ngo_profile::Model> {
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .get_mut(id)
            .ok_or_else(|| profile_not_found(id))?;

        profile.total_rescues = profile.total_rescues.saturating_add(1);
        Ok(profile.clone())
    }

    async fn update_rating(&self, id: &str, rating: f64) -> AppResult<ngo_profile::Model> {
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .get_mut(id)
            .ok_or_else(|| profile_not_found(id))?;

        profile.rating = rating;
        Ok(profile.clone())
    }

    async fn count_by_status(&self) -> AppResult<NgoCounts> {
        let state = self.state.read().await;
        Ok(state
            .profiles
            .values()
            .fold(NgoCounts::default(), |mut counts, p| {
                match p.status {
                    NgoStatus::PendingApproval => counts.pending += 1,
                    NgoStatus::Approved => counts.approved += 1,
                    NgoStatus::Suspended => counts.suspended += 1,
                }
                counts
            }))
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn create(&self, model: admin_account::Model) -> AppResult<admin_account::Model> {
        let mut state = self.state.write().await;
        let taken = state
            .admins
            .values()
            .any(|a| a.username.eq_ignore_ascii_case(&model.username));
        if taken || state.admins.contains_key(&model.id) {
            return Err(AppError::Conflict(
                "An admin with this username already exists".to_string(),
            ));
        }
        state.admins.insert(model.id.clone(), model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<admin_account::Model>> {
        Ok(self.state.read().await.admins.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<admin_account::Model>> {
        let username = username.trim();
        Ok(self
            .state
            .read()
            .await
            .admins
            .values()
            .find(|a| a.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<admin_account::Model>> {
        Ok(self
            .state
            .read()
            .await
            .admins
            .values()
            .find(|a| a.token.as_deref() == Some(token))
            .cloned())
    }
}
