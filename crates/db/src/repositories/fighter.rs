//! Fighter repository.

use std::sync::Arc;

use crate::entities::{Fighter, fighter, fighter::Gender};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use taisen_common::{AppError, AppResult};

use super::map_write_err;

/// Fighter repository for database operations.
#[derive(Clone)]
pub struct FighterRepository {
    db: Arc<DatabaseConnection>,
}

impl FighterRepository {
    /// Create a new fighter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a fighter by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<fighter::Model>> {
        Fighter::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find fighters by IDs.
    pub async fn find_by_ids(&self, ids: &[i32]) -> AppResult<Vec<fighter::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Fighter::find()
            .filter(fighter::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a fighter by exact name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<fighter::Model>> {
        Fighter::find()
            .filter(fighter::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List fighters, optionally narrowed by gender and a name substring.
    pub async fn list(
        &self,
        gender: Option<Gender>,
        name_contains: Option<&str>,
        limit: Option<u64>,
    ) -> AppResult<Vec<fighter::Model>> {
        let mut query = Fighter::find().order_by_asc(fighter::Column::Name);

        if let Some(gender) = gender {
            query = query.filter(fighter::Column::Gender.eq(gender));
        }
        if let Some(fragment) = name_contains.filter(|s| !s.is_empty()) {
            query = query.filter(fighter::Column::Name.contains(fragment));
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add a fighter to the roster.
    pub async fn create(&self, name: &str, gender: Gender) -> AppResult<fighter::Model> {
        let model = fighter::ActiveModel {
            name: Set(name.to_string()),
            gender: Set(gender),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(e, "fighter"))
    }

    /// Remove a fighter. Cards and Top 4 picks referencing it cascade.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = Fighter::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}
