//! Top 4 service: personal rankings per weight class and the community view.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use taisen_common::{AppError, AppResult};
use taisen_db::{
    entities::fighter::Gender,
    repositories::{FighterRepository, UserTop4Repository, WeightClassRepository},
};
use validator::Validate;

use super::session::Session;
use super::views::{FighterRef, WeightClassRef};

/// Slots per board.
pub const TOP4_SLOTS: usize = 4;

/// Input for saving a board.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveTop4Input {
    /// Weight class the board belongs to.
    #[validate(range(min = 1))]
    pub weight_class_id: i32,
    /// Fighters in rank order.
    #[validate(length(min = 1, max = 4))]
    pub fighter_ids: Vec<i32>,
}

/// Input for clearing one slot.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClearTop4SlotInput {
    /// Weight class of the board.
    #[validate(range(min = 1))]
    pub weight_class_id: i32,
    /// 1-based slot to empty.
    #[validate(range(min = 1, max = 4))]
    pub position: i16,
}

/// One user's board for a weight class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Top4Board {
    /// Weight class of the board.
    pub weight_class: WeightClassRef,
    /// Always four entries; `None` for an empty slot.
    pub slots: Vec<Option<FighterRef>>,
}

/// A fighter on the community board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPick {
    /// The picked fighter.
    pub fighter: FighterRef,
    /// Users who placed the fighter anywhere in their Top 4.
    pub picks: i64,
}

/// Most picked fighters for a weight class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityBoard {
    /// Weight class of the board.
    pub weight_class: WeightClassRef,
    /// Up to four fighters, most picked first.
    pub picks: Vec<CommunityPick>,
}

/// Top 4 service for business logic.
#[derive(Clone)]
pub struct Top4Service {
    top4_repo: UserTop4Repository,
    fighter_repo: FighterRepository,
    weight_class_repo: WeightClassRepository,
}

impl Top4Service {
    /// Create a new Top 4 service.
    #[must_use]
    pub const fn new(
        top4_repo: UserTop4Repository,
        fighter_repo: FighterRepository,
        weight_class_repo: WeightClassRepository,
    ) -> Self {
        Self {
            top4_repo,
            fighter_repo,
            weight_class_repo,
        }
    }

    /// Replace the caller's board for one weight class.
    pub async fn save(&self, session: &Session, input: SaveTop4Input) -> AppResult<Top4Board> {
        let user_id = session.require_user()?;

        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let unique: BTreeSet<i32> = input.fighter_ids.iter().copied().collect();
        if unique.len() != input.fighter_ids.len() {
            return Err(AppError::Validation(
                "A fighter can only appear once".to_string(),
            ));
        }

        let weight_class = self
            .weight_class_repo
            .find_by_id(input.weight_class_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Weight class {}", input.weight_class_id))
            })?;

        let fighters = self.fighter_repo.find_by_ids(&input.fighter_ids).await?;
        if fighters.len() != unique.len() {
            return Err(AppError::Validation("Unknown fighter selected".to_string()));
        }
        if fighters.iter().any(|f| f.gender != weight_class.gender) {
            return Err(AppError::Validation(
                "Fighters must match the weight class gender".to_string(),
            ));
        }

        let saved = self
            .top4_repo
            .replace(user_id, weight_class.id, &input.fighter_ids)
            .await?;

        tracing::debug!(
            user_id = %user_id,
            weight_class_id = weight_class.id,
            slots = saved.len(),
            "Top 4 saved"
        );

        let by_id: HashMap<i32, FighterRef> =
            fighters.iter().map(|f| (f.id, FighterRef::from(f))).collect();
        let mut slots = vec![None; TOP4_SLOTS];
        for row in &saved {
            if let Some(slot) = slot_index(row.position).and_then(|i| slots.get_mut(i)) {
                *slot = by_id.get(&row.fighter_id).cloned();
            }
        }

        Ok(Top4Board {
            weight_class: (&weight_class).into(),
            slots,
        })
    }

    /// Empty one slot of the caller's board.
    pub async fn clear_slot(&self, session: &Session, input: ClearTop4SlotInput) -> AppResult<()> {
        let user_id = session.require_user()?;

        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if !self
            .top4_repo
            .clear_slot(user_id, input.weight_class_id, input.position)
            .await?
        {
            return Err(AppError::NotFound("Top 4 slot".to_string()));
        }
        Ok(())
    }

    /// The caller's boards for every weight class of `gender`.
    pub async fn my_boards(&self, session: &Session, gender: Gender) -> AppResult<Vec<Top4Board>> {
        let user_id = session.require_user()?;

        let classes = self.weight_class_repo.list(Some(gender)).await?;
        let rows = self.top4_repo.find_by_user(user_id).await?;
        let fighter_ids: Vec<i32> = rows
            .iter()
            .map(|r| r.fighter_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let fighters: HashMap<i32, FighterRef> = self
            .fighter_repo
            .find_by_ids(&fighter_ids)
            .await?
            .iter()
            .map(|f| (f.id, f.into()))
            .collect();

        Ok(classes
            .iter()
            .map(|class| {
                let mut slots = vec![None; TOP4_SLOTS];
                for row in rows.iter().filter(|r| r.weight_class_id == class.id) {
                    if let Some(slot) = slot_index(row.position).and_then(|i| slots.get_mut(i)) {
                        *slot = fighters.get(&row.fighter_id).cloned();
                    }
                }
                Top4Board {
                    weight_class: class.into(),
                    slots,
                }
            })
            .collect())
    }

    /// The four most picked fighters per weight class of `gender`.
    pub async fn community_boards(&self, gender: Gender) -> AppResult<Vec<CommunityBoard>> {
        let classes = self.weight_class_repo.list(Some(gender)).await?;
        let class_ids: Vec<i32> = classes.iter().map(|c| c.id).collect();
        let counts = self.top4_repo.pick_counts(&class_ids).await?;

        let fighter_ids: Vec<i32> = counts
            .iter()
            .map(|c| c.fighter_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let fighters: HashMap<i32, FighterRef> = self
            .fighter_repo
            .find_by_ids(&fighter_ids)
            .await?
            .iter()
            .map(|f| (f.id, f.into()))
            .collect();

        Ok(classes
            .iter()
            .map(|class| {
                let mut picks: Vec<CommunityPick> = counts
                    .iter()
                    .filter(|c| c.weight_class_id == class.id)
                    .filter_map(|c| {
                        fighters.get(&c.fighter_id).map(|f| CommunityPick {
                            fighter: f.clone(),
                            picks: c.picks,
                        })
                    })
                    .collect();
                picks.sort_by(|a, b| b.picks.cmp(&a.picks).then(a.fighter.id.cmp(&b.fighter.id)));
                picks.truncate(TOP4_SLOTS);
                CommunityBoard {
                    weight_class: class.into(),
                    picks,
                }
            })
            .collect())
    }
}

fn slot_index(position: i16) -> Option<usize> {
    usize::try_from(position)
        .ok()
        .and_then(|p| p.checked_sub(1))
        .filter(|i| *i < TOP4_SLOTS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;
    use taisen_db::entities::{fighter, user_top4, weight_class};
    use uuid::Uuid;

    fn service(db: DatabaseConnection) -> Top4Service {
        let db = Arc::new(db);
        Top4Service::new(
            UserTop4Repository::new(db.clone()),
            FighterRepository::new(db.clone()),
            WeightClassRepository::new(db),
        )
    }

    fn fighter(id: i32, gender: Gender) -> fighter::Model {
        fighter::Model {
            id,
            name: format!("Fighter {id}"),
            gender,
            created_at: Utc::now().into(),
        }
    }

    fn class(id: i32, gender: Gender) -> weight_class::Model {
        weight_class::Model {
            id,
            name: format!("Class {id}"),
            gender,
            created_at: Utc::now().into(),
        }
    }

    fn row(user_id: Uuid, class_id: i32, fighter_id: i32, position: i16) -> user_top4::Model {
        user_top4::Model {
            id: fighter_id,
            user_id,
            weight_class_id: class_id,
            fighter_id,
            position,
            created_at: Utc::now().into(),
        }
    }

    fn pick(class_id: i32, fighter_id: i32, picks: i64) -> std::collections::BTreeMap<&'static str, Value> {
        maplit::btreemap! {
            "weight_class_id" => Value::Int(Some(class_id)),
            "fighter_id" => Value::Int(Some(fighter_id)),
            "picks" => Value::BigInt(Some(picks)),
        }
    }

    #[tokio::test]
    async fn test_save_rejects_duplicates() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc
            .save(
                &Session::user(Uuid::new_v4()),
                SaveTop4Input {
                    weight_class_id: 1,
                    fighter_ids: vec![3, 5, 3],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_save_rejects_more_than_four() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = svc
            .save(
                &Session::user(Uuid::new_v4()),
                SaveTop4Input {
                    weight_class_id: 1,
                    fighter_ids: vec![1, 2, 3, 4, 5],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_save_rejects_gender_mismatch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[class(1, Gender::Female)]])
            .append_query_results([[fighter(3, Gender::Male)]])
            .into_connection();
        let svc = service(db);

        let result = svc
            .save(
                &Session::user(Uuid::new_v4()),
                SaveTop4Input {
                    weight_class_id: 1,
                    fighter_ids: vec![3],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_save_builds_board() {
        let user = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[class(1, Gender::Male)]])
            .append_query_results([[fighter(5, Gender::Male), fighter(9, Gender::Male)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results([[row(user, 1, 9, 1)]])
            .append_query_results([[row(user, 1, 5, 2)]])
            .into_connection();
        let svc = service(db);

        let board = svc
            .save(
                &Session::user(user),
                SaveTop4Input {
                    weight_class_id: 1,
                    fighter_ids: vec![9, 5],
                },
            )
            .await
            .unwrap();

        assert_eq!(board.slots.len(), 4);
        assert_eq!(board.slots[0].as_ref().unwrap().id, 9);
        assert_eq!(board.slots[1].as_ref().unwrap().id, 5);
        assert!(board.slots[2].is_none());
    }

    #[tokio::test]
    async fn test_my_boards_fill_empty_slots() {
        let user = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[class(1, Gender::Male), class(2, Gender::Male)]])
            .append_query_results([[row(user, 2, 7, 3)]])
            .append_query_results([[fighter(7, Gender::Male)]])
            .into_connection();
        let svc = service(db);

        let boards = svc.my_boards(&Session::user(user), Gender::Male).await.unwrap();

        assert_eq!(boards.len(), 2);
        assert!(boards[0].slots.iter().all(Option::is_none));
        assert_eq!(boards[1].slots[2].as_ref().unwrap().id, 7);
    }

    #[tokio::test]
    async fn test_community_boards_keep_top_four() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[class(1, Gender::Female)]])
            .append_query_results([vec![
                pick(1, 4, 9),
                pick(1, 2, 9),
                pick(1, 8, 7),
                pick(1, 1, 3),
                pick(1, 6, 1),
            ]])
            .append_query_results([[1, 2, 4, 6, 8].map(|id| fighter(id, Gender::Female))])
            .into_connection();
        let svc = service(db);

        let boards = svc.community_boards(Gender::Female).await.unwrap();

        assert_eq!(boards.len(), 1);
        let ids: Vec<i32> = boards[0].picks.iter().map(|p| p.fighter.id).collect();
        assert_eq!(ids, vec![2, 4, 8, 1]);
        assert_eq!(boards[0].picks[0].picks, 9);
    }

    #[tokio::test]
    async fn test_clear_missing_slot() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let svc = service(db);

        let result = svc
            .clear_slot(
                &Session::user(Uuid::new_v4()),
                ClearTop4SlotInput {
                    weight_class_id: 1,
                    position: 2,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
