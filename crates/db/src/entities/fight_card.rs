//! Fight card entity.
//!
//! `fighter1_votes`, `fighter2_votes` and `popularity_votes` are caches of
//! the vote ledger. They are only written by the tally engine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fight_card")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub fighter1_id: i32,

    #[sea_orm(indexed)]
    pub fighter2_id: i32,

    pub organization_id: i32,

    pub weight_class_id: i32,

    /// Predictions for fighter 1
    #[sea_orm(default_value = 0)]
    pub fighter1_votes: i32,

    /// Predictions for fighter 2
    #[sea_orm(default_value = 0)]
    pub fighter2_votes: i32,

    /// "Want to see this fight" votes
    #[sea_orm(default_value = 0)]
    pub popularity_votes: i32,

    /// User who proposed the card
    #[sea_orm(indexed)]
    pub created_by: Uuid,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fighter::Entity",
        from = "Column::Fighter1Id",
        to = "super::fighter::Column::Id",
        on_delete = "Cascade"
    )]
    Fighter1,

    #[sea_orm(
        belongs_to = "super::fighter::Entity",
        from = "Column::Fighter2Id",
        to = "super::fighter::Column::Id",
        on_delete = "Cascade"
    )]
    Fighter2,

    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,

    #[sea_orm(
        belongs_to = "super::weight_class::Entity",
        from = "Column::WeightClassId",
        to = "super::weight_class::Column::Id"
    )]
    WeightClass,

    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::weight_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeightClass.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
