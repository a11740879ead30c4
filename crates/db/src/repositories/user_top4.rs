//! User Top 4 repository.

use std::sync::Arc;

use crate::entities::{UserTop4, user_top4};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, prelude::Expr,
};
use taisen_common::{AppError, AppResult};
use uuid::Uuid;

use super::map_write_err;

/// How many users placed a fighter anywhere in their Top 4 for a class.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct PickCount {
    /// Weight class.
    pub weight_class_id: i32,
    /// Fighter.
    pub fighter_id: i32,
    /// Number of users who picked the fighter.
    pub picks: i64,
}

/// User Top 4 repository for database operations.
#[derive(Clone)]
pub struct UserTop4Repository {
    db: Arc<DatabaseConnection>,
}

impl UserTop4Repository {
    /// Create a new Top 4 repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// A user's selections, ordered by class then position.
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<user_top4::Model>> {
        UserTop4::find()
            .filter(user_top4::Column::UserId.eq(user_id))
            .order_by_asc(user_top4::Column::WeightClassId)
            .order_by_asc(user_top4::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace a user's selections for one weight class.
    ///
    /// Positions follow the order of `fighter_ids`, starting at 1.
    pub async fn replace(
        &self,
        user_id: Uuid,
        weight_class_id: i32,
        fighter_ids: &[i32],
    ) -> AppResult<Vec<user_top4::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        UserTop4::delete_many()
            .filter(user_top4::Column::UserId.eq(user_id))
            .filter(user_top4::Column::WeightClassId.eq(weight_class_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let now = Utc::now();
        let mut saved = Vec::with_capacity(fighter_ids.len());
        for (index, fighter_id) in fighter_ids.iter().enumerate() {
            let model = user_top4::ActiveModel {
                user_id: Set(user_id),
                weight_class_id: Set(weight_class_id),
                fighter_id: Set(*fighter_id),
                position: Set(index as i16 + 1),
                created_at: Set(now.into()),
                ..Default::default()
            };
            let inserted = UserTop4::insert(model)
                .exec_with_returning(&txn)
                .await
                .map_err(|e| map_write_err(e, "top 4 slot"))?;
            saved.push(inserted);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(saved)
    }

    /// Remove one slot. Returns whether a row was removed.
    pub async fn clear_slot(
        &self,
        user_id: Uuid,
        weight_class_id: i32,
        position: i16,
    ) -> AppResult<bool> {
        let result = UserTop4::delete_many()
            .filter(user_top4::Column::UserId.eq(user_id))
            .filter(user_top4::Column::WeightClassId.eq(weight_class_id))
            .filter(user_top4::Column::Position.eq(position))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Pick counts per fighter for the given classes, most picked first.
    pub async fn pick_counts(&self, weight_class_ids: &[i32]) -> AppResult<Vec<PickCount>> {
        if weight_class_ids.is_empty() {
            return Ok(vec![]);
        }

        UserTop4::find()
            .select_only()
            .column(user_top4::Column::WeightClassId)
            .column(user_top4::Column::FighterId)
            .column_as(user_top4::Column::UserId.count(), "picks")
            .filter(user_top4::Column::WeightClassId.is_in(weight_class_ids.iter().copied()))
            .group_by(user_top4::Column::WeightClassId)
            .group_by(user_top4::Column::FighterId)
            .order_by_asc(user_top4::Column::WeightClassId)
            .order_by_desc(Expr::cust("picks"))
            .order_by_asc(user_top4::Column::FighterId)
            .into_model::<PickCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
