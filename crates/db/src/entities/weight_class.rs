//! Weight class entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::fighter::Gender;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weight_class")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Divisions are split by gender; the same name may exist for both.
    pub gender: Gender,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fight_card::Entity")]
    FightCard,
    #[sea_orm(has_many = "super::user_top4::Entity")]
    UserTop4,
}

impl Related<super::fight_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FightCard.def()
    }
}

impl Related<super::user_top4::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserTop4.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
