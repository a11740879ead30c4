//! Fighter request entity for roster change proposals.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::fighter::Gender;

/// What the request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    #[sea_orm(string_value = "add")]
    Add,
    #[sea_orm(string_value = "delete")]
    Delete,
}

/// Why a fighter should leave the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum DeleteReason {
    #[sea_orm(string_value = "retirement")]
    Retirement,
    #[sea_orm(string_value = "switch_sport")]
    SwitchSport,
}

/// Review status. `Approved` and `Rejected` are terminal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fighter_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub request_type: RequestType,

    /// Name to add, or the name of the fighter to remove
    pub player_name: String,

    /// Gender of a fighter to add
    #[sea_orm(nullable)]
    pub player_gender: Option<Gender>,

    /// Fighter to remove (delete requests)
    #[sea_orm(nullable)]
    pub target_fighter_id: Option<i32>,

    #[sea_orm(nullable)]
    pub delete_reason: Option<DeleteReason>,

    #[sea_orm(indexed)]
    pub status: RequestStatus,

    #[sea_orm(indexed)]
    pub created_by: Uuid,

    pub created_at: DateTimeWithTimeZone,

    /// Admin who approved or rejected the request
    #[sea_orm(nullable)]
    pub processed_by: Option<Uuid>,

    #[sea_orm(nullable)]
    pub processed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fighter::Entity",
        from = "Column::TargetFighterId",
        to = "super::fighter::Column::Id",
        on_delete = "SetNull"
    )]
    TargetFighter,
}

impl Related<super::fighter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TargetFighter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
