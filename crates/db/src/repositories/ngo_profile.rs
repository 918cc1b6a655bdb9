//! NGO profile repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pawlink_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, sea_query::Expr,
};

use super::report::search_condition;
use super::store::{NgoCounts, NgoFilter, NgoStore, ProfileSetup, normalized_search};
use crate::entities::{
    NgoProfile,
    ngo_profile::{self, NgoStatus},
};

/// NGO profile repository for database operations.
#[derive(Clone)]
pub struct NgoProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl NgoProfileRepository {
    /// Create a new NGO profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// Maps a unique-key violation to `Conflict`, anything else to `Database`.
pub(crate) fn insert_error(err: &DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("{what} already exists"))
        }
        _ => AppError::Database(err.to_string()),
    }
}

#[async_trait]
impl NgoStore for NgoProfileRepository {
    async fn create(&self, model: ngo_profile::Model) -> AppResult<ngo_profile::Model> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| insert_error(&e, "An NGO with this email"))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<ngo_profile::Model>> {
        NgoProfile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<ngo_profile::Model>> {
        NgoProfile::find()
            .filter(ngo_profile::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ngo_profile::Model>> {
        NgoProfile::find()
            .filter(ngo_profile::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list(&self, filter: &NgoFilter) -> AppResult<Vec<ngo_profile::Model>> {
        let mut query = NgoProfile::find()
            .order_by_desc(ngo_profile::Column::RegisteredAt)
            .order_by_asc(ngo_profile::Column::Id);

        if let Some(status) = filter.status {
            query = query.filter(ngo_profile::Column::Status.eq(status));
        }
        if let Some(needle) = normalized_search(filter.search.as_deref()) {
            query = query.filter(search_condition(
                &[ngo_profile::Column::Name, ngo_profile::Column::Email],
                &needle,
            ));
        }

        let profiles = query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Capability membership is checked on the decoded JSON array
        Ok(match &filter.capability {
            Some(capability) => profiles
                .into_iter()
                .filter(|p| p.has_capability(capability))
                .collect(),
            None => profiles,
        })
    }

    async fn update_setup(
        &self,
        id: &str,
        setup: &ProfileSetup,
    ) -> AppResult<ngo_profile::Model> {
        let profile = self.get_by_id(id).await?;

        let mut model: ngo_profile::ActiveModel = profile.into();
        model.name = Set(setup.name.clone());
        model.description = Set(setup.description.clone());
        model.animals = Set(serde_json::json!(setup.animals));
        model.transport = Set(setup.transport);
        model.latitude = Set(setup.latitude);
        model.longitude = Set(setup.longitude);
        model.address = Set(setup.address.clone());
        model.contact_phone = Set(setup.contact_phone.clone());
        model.website = Set(setup.website.clone());
        model.profile_complete = Set(true);

        // Only the Set columns are written, so counters stay untouched
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_status(
        &self,
        id: &str,
        status: NgoStatus,
        at: DateTime<Utc>,
    ) -> AppResult<ngo_profile::Model> {
        let profile = self.get_by_id(id).await?;
        let first_approval = status == NgoStatus::Approved && profile.approved_at.is_none();

        let mut model: ngo_profile::ActiveModel = profile.into();
        model.status = Set(status);
        if first_approval {
            model.approved_at = Set(Some(at.into()));
        }

        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn increment_rescues(&self, id: &str) -> AppResult<ngo_profile::Model> {
        let result = NgoProfile::update_many()
            .col_expr(
                ngo_profile::Column::TotalRescues,
                Expr::col(ngo_profile::Column::TotalRescues).add(1),
            )
            .filter(ngo_profile::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("NGO {id} not found")));
        }
        self.get_by_id(id).await
    }

    async fn update_rating(&self, id: &str, rating: f64) -> AppResult<ngo_profile::Model> {
        let result = NgoProfile::update_many()
            .col_expr(ngo_profile::Column::Rating, Expr::value(rating))
            .filter(ngo_profile::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("NGO {id} not found")));
        }
        self.get_by_id(id).await
    }

    async fn count_by_status(&self) -> AppResult<NgoCounts> {
        let count = |status: NgoStatus| {
            NgoProfile::find()
                .filter(ngo_profile::Column::Status.eq(status))
                .count(self.db.as_ref())
        };

        Ok(NgoCounts {
            pending: count(NgoStatus::PendingApproval)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            approved: count(NgoStatus::Approved)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            suspended: count(NgoStatus::Suspended)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        })
    }
}
