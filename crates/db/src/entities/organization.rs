//! Organization (promotion) entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organization")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fight_card::Entity")]
    FightCard,
}

impl Related<super::fight_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FightCard.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
