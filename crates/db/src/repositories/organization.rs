//! Organization repository.

use std::sync::Arc;

use crate::entities::{Organization, organization};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use taisen_common::{AppError, AppResult};

/// Organization repository for database operations.
#[derive(Clone)]
pub struct OrganizationRepository {
    db: Arc<DatabaseConnection>,
}

impl OrganizationRepository {
    /// Create a new organization repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an organization by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<organization::Model>> {
        Organization::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find organizations by IDs.
    pub async fn find_by_ids(&self, ids: &[i32]) -> AppResult<Vec<organization::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Organization::find()
            .filter(organization::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All organizations in ID order.
    pub async fn find_all(&self) -> AppResult<Vec<organization::Model>> {
        Organization::find()
            .order_by_asc(organization::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
