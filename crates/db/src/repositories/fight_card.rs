//! Fight card repository.

use std::sync::Arc;

use crate::entities::{FightCard, fight_card};
use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, prelude::Expr,
};
use taisen_common::{AppError, AppResult};
use uuid::Uuid;

use super::map_write_err;

/// One of the three cached counters on a fight card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TallyColumn {
    /// `fighter1_votes`
    Fighter1,
    /// `fighter2_votes`
    Fighter2,
    /// `popularity_votes`
    Popularity,
}

impl TallyColumn {
    const fn column(self) -> fight_card::Column {
        match self {
            Self::Fighter1 => fight_card::Column::Fighter1Votes,
            Self::Fighter2 => fight_card::Column::Fighter2Votes,
            Self::Popularity => fight_card::Column::PopularityVotes,
        }
    }

    const fn decrement_sql(self) -> &'static str {
        match self {
            Self::Fighter1 => "GREATEST(fighter1_votes - 1, 0)",
            Self::Fighter2 => "GREATEST(fighter2_votes - 1, 0)",
            Self::Popularity => "GREATEST(popularity_votes - 1, 0)",
        }
    }
}

/// Fight card repository for database operations.
#[derive(Clone)]
pub struct FightCardRepository {
    db: Arc<DatabaseConnection>,
}

impl FightCardRepository {
    /// Create a new fight card repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a fight card by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<fight_card::Model>> {
        FightCard::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a fight card by ID, failing if it does not exist.
    pub async fn get_by_id(&self, id: i32) -> AppResult<fight_card::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::FightCardNotFound(id))
    }

    /// All fight cards, most popular first.
    pub async fn find_all(&self) -> AppResult<Vec<fight_card::Model>> {
        FightCard::find()
            .order_by_desc(fight_card::Column::PopularityVotes)
            .order_by_asc(fight_card::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fight cards with the given IDs, most popular first.
    pub async fn find_by_ids(&self, ids: &[i32]) -> AppResult<Vec<fight_card::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        FightCard::find()
            .filter(fight_card::Column::Id.is_in(ids.iter().copied()))
            .order_by_desc(fight_card::Column::PopularityVotes)
            .order_by_asc(fight_card::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an existing card for the same matchup, in either corner order.
    pub async fn find_matchup(
        &self,
        fighter_a: i32,
        fighter_b: i32,
        organization_id: i32,
        weight_class_id: i32,
    ) -> AppResult<Option<fight_card::Model>> {
        let pair = Condition::any()
            .add(
                Condition::all()
                    .add(fight_card::Column::Fighter1Id.eq(fighter_a))
                    .add(fight_card::Column::Fighter2Id.eq(fighter_b)),
            )
            .add(
                Condition::all()
                    .add(fight_card::Column::Fighter1Id.eq(fighter_b))
                    .add(fight_card::Column::Fighter2Id.eq(fighter_a)),
            );

        FightCard::find()
            .filter(pair)
            .filter(fight_card::Column::OrganizationId.eq(organization_id))
            .filter(fight_card::Column::WeightClassId.eq(weight_class_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count cards a user created at or after `since`.
    pub async fn count_created_since(
        &self,
        user_id: Uuid,
        since: DateTime<FixedOffset>,
    ) -> AppResult<u64> {
        FightCard::find()
            .filter(fight_card::Column::CreatedBy.eq(user_id))
            .filter(fight_card::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new fight card.
    ///
    /// A second card for the same matchup is rejected by the unique index
    /// and reported as [`AppError::Conflict`].
    pub async fn create(&self, model: fight_card::ActiveModel) -> AppResult<fight_card::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(e, "fight card"))
    }

    /// Increment a counter atomically and return the updated card.
    pub async fn increment(
        &self,
        card_id: i32,
        column: TallyColumn,
    ) -> AppResult<Option<fight_card::Model>> {
        let col = column.column();
        let updated = FightCard::update_many()
            .col_expr(col, Expr::col(col).add(1))
            .filter(fight_card::Column::Id.eq(card_id))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(updated.into_iter().next())
    }

    /// Decrement a counter atomically, floored at zero, and return the updated card.
    pub async fn decrement(
        &self,
        card_id: i32,
        column: TallyColumn,
    ) -> AppResult<Option<fight_card::Model>> {
        let updated = FightCard::update_many()
            .col_expr(column.column(), Expr::cust(column.decrement_sql()))
            .filter(fight_card::Column::Id.eq(card_id))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(updated.into_iter().next())
    }

    /// Overwrite all three counters.
    pub async fn set_counters(
        &self,
        card_id: i32,
        fighter1_votes: i32,
        fighter2_votes: i32,
        popularity_votes: i32,
    ) -> AppResult<fight_card::Model> {
        let active = fight_card::ActiveModel {
            id: Set(card_id),
            fighter1_votes: Set(fighter1_votes),
            fighter2_votes: Set(fighter2_votes),
            popularity_votes: Set(popularity_votes),
            ..Default::default()
        };

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| match e {
                sea_orm::DbErr::RecordNotUpdated => AppError::FightCardNotFound(card_id),
                other => AppError::Database(other.to_string()),
            })
    }
}
