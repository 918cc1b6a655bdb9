//! Admin account repository.

use std::sync::Arc;

use async_trait::async_trait;
use pawlink_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
};

use super::ngo_profile::insert_error;
use super::store::AdminStore;
use crate::entities::{AdminAccount, admin_account};

/// Admin account repository for database operations.
#[derive(Clone)]
pub struct AdminAccountRepository {
    db: Arc<DatabaseConnection>,
}

impl AdminAccountRepository {
    /// Create a new admin account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdminStore for AdminAccountRepository {
    async fn create(&self, model: admin_account::Model) -> AppResult<admin_account::Model> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| insert_error(&e, "An admin with this username"))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<admin_account::Model>> {
        AdminAccount::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<admin_account::Model>> {
        AdminAccount::find()
            .filter(admin_account::Column::Username.eq(username.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<admin_account::Model>> {
        AdminAccount::find()
            .filter(admin_account::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
