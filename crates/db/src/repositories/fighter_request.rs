//! Fighter request repository.

use std::sync::Arc;

use crate::entities::{
    FighterRequest, fighter_request,
    fighter_request::RequestStatus,
};
use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use taisen_common::{AppError, AppResult};
use uuid::Uuid;

/// Fighter request repository for database operations.
#[derive(Clone)]
pub struct FighterRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl FighterRequestRepository {
    /// Create a new fighter request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a request by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<fighter_request::Model>> {
        FighterRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Requests newest first, optionally with one status.
    pub async fn list(
        &self,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<fighter_request::Model>> {
        let mut query = FighterRequest::find().order_by_desc(fighter_request::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(fighter_request::Column::Status.eq(status));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count requests a user submitted at or after `since`.
    pub async fn count_created_since(
        &self,
        user_id: Uuid,
        since: DateTime<FixedOffset>,
    ) -> AppResult<u64> {
        FighterRequest::find()
            .filter(fighter_request::Column::CreatedBy.eq(user_id))
            .filter(fighter_request::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a request.
    pub async fn create(
        &self,
        model: fighter_request::ActiveModel,
    ) -> AppResult<fighter_request::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record the review outcome of a pending request.
    ///
    /// Only a row still `pending` is updated. Fails with `AlreadyProcessed`
    /// if another review got there first, or `NotFound` if the row is gone.
    pub async fn mark_processed(
        &self,
        id: i32,
        status: RequestStatus,
        processed_by: Uuid,
        processed_at: DateTime<FixedOffset>,
    ) -> AppResult<fighter_request::Model> {
        let updated = FighterRequest::update_many()
            .set(fighter_request::ActiveModel {
                status: Set(status),
                processed_by: Set(Some(processed_by)),
                processed_at: Set(Some(processed_at)),
                ..Default::default()
            })
            .filter(fighter_request::Column::Id.eq(id))
            .filter(fighter_request::Column::Status.eq(RequestStatus::Pending))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(model) = updated.into_iter().next() {
            return Ok(model);
        }

        match self.find_by_id(id).await? {
            Some(current) => Err(AppError::AlreadyProcessed(format!(
                "Fighter request {id} is already {:?}",
                current.status
            ))),
            None => Err(AppError::NotFound(format!("Fighter request {id}"))),
        }
    }

    /// Delete a request. Returns whether a row was removed.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = FighterRequest::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}
