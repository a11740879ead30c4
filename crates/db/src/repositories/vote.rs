//! Vote ledger repository.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entities::{Vote, vote, vote::VoteType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use taisen_common::{AppError, AppResult};
use uuid::Uuid;

use super::map_write_err;

/// Ledger-derived counts for one card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardVoteCounts {
    /// Predictions for fighter 1.
    pub fighter1: i64,
    /// Predictions for fighter 2.
    pub fighter2: i64,
    /// Popularity votes.
    pub popularity: i64,
}

impl CardVoteCounts {
    fn add(&mut self, vote_type: VoteType, vote_for: Option<i16>, count: i64) {
        match (vote_type, vote_for) {
            (VoteType::Popularity, _) => self.popularity += count,
            (VoteType::Prediction, Some(1)) => self.fighter1 += count,
            (VoteType::Prediction, Some(2)) => self.fighter2 += count,
            (VoteType::Prediction, other) => {
                tracing::warn!(vote_for = ?other, "Ignoring prediction rows without a valid side");
            }
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    fight_card_id: i32,
    vote_type: VoteType,
    vote_for: Option<i16>,
    count: i64,
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the vote a user holds on a card for the given type.
    pub async fn find_by_user_card_type(
        &self,
        user_id: Uuid,
        fight_card_id: i32,
        vote_type: VoteType,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::FightCardId.eq(fight_card_id))
            .filter(vote::Column::VoteType.eq(vote_type))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the votes of one type a user currently holds.
    pub async fn count_by_user_and_type(
        &self,
        user_id: Uuid,
        vote_type: VoteType,
    ) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::VoteType.eq(vote_type))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All votes a user holds, newest first.
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .order_by_desc(vote::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a vote.
    ///
    /// A duplicate `(user, card, type)` is reported as [`AppError::Conflict`].
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(e, "vote"))
    }

    /// Delete a vote by ID. Returns whether a row was removed.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = Vote::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Recount one card from the ledger.
    pub async fn count_for_card(&self, fight_card_id: i32) -> AppResult<CardVoteCounts> {
        let rows = self.grouped_counts(Some(fight_card_id)).await?;
        let mut counts = CardVoteCounts::default();
        for row in rows {
            counts.add(row.vote_type, row.vote_for, row.count);
        }
        Ok(counts)
    }

    /// Recount every card that has at least one vote.
    pub async fn count_all_cards(&self) -> AppResult<BTreeMap<i32, CardVoteCounts>> {
        let rows = self.grouped_counts(None).await?;
        let mut by_card: BTreeMap<i32, CardVoteCounts> = BTreeMap::new();
        for row in rows {
            by_card
                .entry(row.fight_card_id)
                .or_default()
                .add(row.vote_type, row.vote_for, row.count);
        }
        Ok(by_card)
    }

    async fn grouped_counts(&self, fight_card_id: Option<i32>) -> AppResult<Vec<CountRow>> {
        let mut query = Vote::find()
            .select_only()
            .column(vote::Column::FightCardId)
            .column(vote::Column::VoteType)
            .column(vote::Column::VoteFor)
            .column_as(vote::Column::Id.count(), "count")
            .group_by(vote::Column::FightCardId)
            .group_by(vote::Column::VoteType)
            .group_by(vote::Column::VoteFor);

        if let Some(id) = fight_card_id {
            query = query.filter(vote::Column::FightCardId.eq(id));
        }

        query
            .into_model::<CountRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, RuntimeErr, Set, Value};

    fn popularity_vote(id: i32, user_id: Uuid, card_id: i32) -> vote::Model {
        vote::Model {
            id,
            user_id,
            fight_card_id: card_id,
            vote_type: VoteType::Popularity,
            vote_for: None,
            created_at: Utc::now().into(),
        }
    }

    fn count_row(
        card: i32,
        vote_type: &str,
        vote_for: Option<i16>,
        count: i64,
    ) -> BTreeMap<&'static str, Value> {
        maplit::btreemap! {
            "fight_card_id" => Value::Int(Some(card)),
            "vote_type" => Value::String(Some(Box::new(vote_type.to_string()))),
            "vote_for" => Value::SmallInt(vote_for),
            "count" => Value::BigInt(Some(count)),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_card_type() {
        let user = Uuid::new_v4();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[popularity_vote(1, user, 7)]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let found = repo
            .find_by_user_card_type(user, 7, VoteType::Popularity)
            .await
            .unwrap();

        assert_eq!(found.unwrap().fight_card_id, 7);
    }

    #[tokio::test]
    async fn test_count_by_user_and_type() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(30))
                }]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let count = repo
            .count_by_user_and_type(Uuid::new_v4(), VoteType::Popularity)
            .await
            .unwrap();

        assert_eq!(count, 30);
    }

    #[tokio::test]
    async fn test_create_failure_is_database_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([sea_orm::DbErr::Query(RuntimeErr::Internal(
                    "connection reset".to_string(),
                ))])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let model = vote::ActiveModel {
            user_id: Set(Uuid::new_v4()),
            fight_card_id: Set(1),
            vote_type: Set(VoteType::Popularity),
            vote_for: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let result = repo.create(model).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_delete_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        assert!(repo.delete(1).await.unwrap());
        assert!(!repo.delete(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_for_card() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    count_row(3, "prediction", Some(1), 4),
                    count_row(3, "prediction", Some(2), 2),
                    count_row(3, "popularity", None, 9),
                ]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let counts = repo.count_for_card(3).await.unwrap();

        assert_eq!(
            counts,
            CardVoteCounts {
                fighter1: 4,
                fighter2: 2,
                popularity: 9,
            }
        );
    }

    #[tokio::test]
    async fn test_count_all_cards_groups_by_card() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    count_row(1, "popularity", None, 2),
                    count_row(2, "prediction", Some(2), 1),
                    count_row(1, "prediction", Some(1), 5),
                ]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let counts = repo.count_all_cards().await.unwrap();

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&1].popularity, 2);
        assert_eq!(counts[&1].fighter1, 5);
        assert_eq!(counts[&2].fighter2, 1);
    }
}
