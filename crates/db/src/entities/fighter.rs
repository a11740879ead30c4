//! Fighter entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Competitor gender, shared by fighters and weight classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "female")]
    Female,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fighter")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name, unique across the roster
    #[sea_orm(unique)]
    pub name: String,

    pub gender: Gender,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_top4::Entity")]
    UserTop4,
}

impl Related<super::user_top4::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserTop4.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
