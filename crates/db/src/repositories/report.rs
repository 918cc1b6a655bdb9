//! Report repository.

use std::sync::Arc;

use async_trait::async_trait;
use pawlink_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
    sea_query::{Expr, Func, LikeExpr},
};
use tracing::debug;

use super::store::{
    ReportCounts, ReportFilter, ReportStore, ReportTransition, ensure_approved, normalized_search,
};
use crate::entities::{
    NgoProfile, Report, ngo_profile,
    report::{self, ReportStatus},
};

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn rollback(txn: DatabaseTransaction) -> AppResult<()> {
        txn.rollback()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// `%needle%` with LIKE wildcards escaped by a backslash.
pub(crate) fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Case-insensitive substring match on any of the given columns.
pub(crate) fn search_condition<C>(columns: &[C], needle: &str) -> Condition
where
    C: sea_orm::sea_query::IntoColumnRef + Copy,
{
    let pattern = like_pattern(needle);
    columns.iter().fold(Condition::any(), |cond, column| {
        cond.add(
            Expr::expr(Func::lower(Expr::col(*column)))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    })
}

#[async_trait]
impl ReportStore for ReportRepository {
    async fn create(&self, model: report::Model) -> AppResult<report::Model> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list(&self, filter: &ReportFilter) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find()
            .order_by_desc(report::Column::ReportedAt)
            .order_by_desc(report::Column::Id);

        if let Some(status) = filter.status {
            query = query.filter(report::Column::Status.eq(status));
        }
        if let Some(needle) = normalized_search(filter.search.as_deref()) {
            query = query.filter(search_condition(
                &[report::Column::AnimalType, report::Column::Address],
                &needle,
            ));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        query
            .offset(filter.offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn transition(
        &self,
        id: &str,
        transition: &ReportTransition,
    ) -> AppResult<report::Model> {
        transition.ensure_terminal()?;

        let (by_column, at_column) = match transition.to {
            ReportStatus::Closed => (report::Column::ClosedBy, report::Column::ClosedAt),
            _ => (report::Column::FlaggedBy, report::Column::FlaggedAt),
        };
        let at: sea_orm::prelude::DateTimeWithTimeZone = transition.at.into();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Compare-and-set: the status predicate makes the losing writer match no rows.
        let updated = Report::update_many()
            .col_expr(report::Column::Status, Expr::value(transition.to))
            .col_expr(by_column, Expr::value(transition.actor_id.clone()))
            .col_expr(at_column, Expr::value(at))
            .filter(report::Column::Id.eq(id))
            .filter(report::Column::Status.eq(ReportStatus::Active))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.rows_affected == 0 {
            let existing = Report::find_by_id(id)
                .one(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Self::rollback(txn).await?;

            return Err(match existing {
                None => AppError::NotFound(format!("Report {id} not found")),
                Some(r) => AppError::Conflict(format!(
                    "Report {id} is already {}",
                    r.status.as_str()
                )),
            });
        }

        // Shared row lock: a concurrent status change waits for this transaction.
        if let Some(ngo_id) = &transition.require_approved {
            let profile = NgoProfile::find_by_id(ngo_id.as_str())
                .lock_shared()
                .one(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            let checked = profile
                .ok_or_else(|| AppError::NotFound(format!("NGO {ngo_id} not found")))
                .and_then(|p| ensure_approved(&p));
            if let Err(e) = checked {
                Self::rollback(txn).await?;
                return Err(e);
            }
        }

        if let Some(ngo_id) = &transition.credit_rescue_to {
            let credited = NgoProfile::update_many()
                .col_expr(
                    ngo_profile::Column::TotalRescues,
                    Expr::col(ngo_profile::Column::TotalRescues).add(1),
                )
                .filter(ngo_profile::Column::Id.eq(ngo_id.as_str()))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if credited.rows_affected == 0 {
                Self::rollback(txn).await?;
                return Err(AppError::NotFound(format!("NGO {ngo_id} not found")));
            }
        }

        let report = Report::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        debug!(report_id = %id, status = report.status.as_str(), "Report transition committed");
        Ok(report)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Report::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Report {id} not found")));
        }
        Ok(())
    }

    async fn count_by_status(&self) -> AppResult<ReportCounts> {
        let count = |status: ReportStatus| {
            Report::find()
                .filter(report::Column::Status.eq(status))
                .count(self.db.as_ref())
        };

        Ok(ReportCounts {
            active: count(ReportStatus::Active)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            closed: count(ReportStatus::Closed)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            flagged: count(ReportStatus::Flagged)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        })
    }
}
