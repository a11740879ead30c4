//! Personal Top 4 selection entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_top4")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub user_id: Uuid,

    pub weight_class_id: i32,

    pub fighter_id: i32,

    /// Slot 1 to 4
    pub position: i16,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fighter::Entity",
        from = "Column::FighterId",
        to = "super::fighter::Column::Id",
        on_delete = "Cascade"
    )]
    Fighter,

    #[sea_orm(
        belongs_to = "super::weight_class::Entity",
        from = "Column::WeightClassId",
        to = "super::weight_class::Column::Id",
        on_delete = "Cascade"
    )]
    WeightClass,
}

impl Related<super::fighter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fighter.def()
    }
}

impl Related<super::weight_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeightClass.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
