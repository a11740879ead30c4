//! Vote ledger entity.
//!
//! At most one row per `(user_id, fight_card_id, vote_type)`, enforced by a
//! unique index. `vote_for` is set for predictions only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    /// Win prediction for one side
    #[sea_orm(string_value = "prediction")]
    Prediction,
    /// Desire to see the matchup
    #[sea_orm(string_value = "popularity")]
    Popularity,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub user_id: Uuid,

    #[sea_orm(indexed)]
    pub fight_card_id: i32,

    pub vote_type: VoteType,

    /// 1 or 2 for predictions, null for popularity
    #[sea_orm(nullable)]
    pub vote_for: Option<i16>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fight_card::Entity",
        from = "Column::FightCardId",
        to = "super::fight_card::Column::Id",
        on_delete = "Cascade"
    )]
    FightCard,
}

impl Related<super::fight_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FightCard.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
