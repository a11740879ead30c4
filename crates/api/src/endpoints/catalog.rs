//! Fighter, organization, and weight class listings.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use taisen_common::AppResult;
use taisen_core::{FighterQuery, FighterRef, OrganizationRef, WeightClassRef};
use taisen_db::entities::fighter::Gender;

use crate::{middleware::AppState, response::ApiResponse};

/// List fighters, optionally by gender and name.
async fn fighters(
    State(state): State<AppState>,
    Json(query): Json<FighterQuery>,
) -> AppResult<ApiResponse<Vec<FighterRef>>> {
    let fighters = state.catalog_service.fighters(query).await?;
    Ok(ApiResponse::ok(fighters))
}

/// List organizations.
async fn organizations(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OrganizationRef>>> {
    let organizations = state.catalog_service.organizations().await?;
    Ok(ApiResponse::ok(organizations))
}

/// Weight class listing request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightClassQuery {
    pub gender: Option<Gender>,
}

/// List weight classes.
async fn weight_classes(
    State(state): State<AppState>,
    Json(query): Json<WeightClassQuery>,
) -> AppResult<ApiResponse<Vec<WeightClassRef>>> {
    let classes = state.catalog_service.weight_classes(query.gender).await?;
    Ok(ApiResponse::ok(classes))
}

pub fn fighters_router() -> Router<AppState> {
    Router::new().route("/list", post(fighters))
}

pub fn organizations_router() -> Router<AppState> {
    Router::new().route("/list", post(organizations))
}

pub fn weight_classes_router() -> Router<AppState> {
    Router::new().route("/list", post(weight_classes))
}
