//! Fighter request endpoints.

use axum::{Json, Router, extract::State, middleware, routing::post};
use serde::Serialize;
use taisen_common::AppResult;
use taisen_core::SubmitFighterRequestInput;
use taisen_db::entities::{
    fighter::Gender,
    fighter_request::{self, DeleteReason, RequestStatus, RequestType},
};
use uuid::Uuid;

use crate::{
    extractors::CurrentSession,
    middleware::AppState,
    rate_limit::{RateLimiterState, rate_limit_write_middleware},
    response::ApiResponse,
};

/// Fighter request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterRequestResponse {
    pub id: i32,
    pub request_type: RequestType,
    pub player_name: String,
    pub player_gender: Option<Gender>,
    pub target_fighter_id: Option<i32>,
    pub delete_reason: Option<DeleteReason>,
    pub status: RequestStatus,
    pub created_by: Uuid,
    pub created_at: String,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<String>,
}

impl From<fighter_request::Model> for FighterRequestResponse {
    fn from(r: fighter_request::Model) -> Self {
        Self {
            id: r.id,
            request_type: r.request_type,
            player_name: r.player_name,
            player_gender: r.player_gender,
            target_fighter_id: r.target_fighter_id,
            delete_reason: r.delete_reason,
            status: r.status,
            created_by: r.created_by,
            created_at: r.created_at.to_rfc3339(),
            processed_by: r.processed_by,
            processed_at: r.processed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Submit a roster change request.
async fn create(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(input): Json<SubmitFighterRequestInput>,
) -> AppResult<ApiResponse<FighterRequestResponse>> {
    let request = state
        .fighter_request_service
        .submit(&session, input)
        .await?;
    Ok(ApiResponse::ok(request.into()))
}

pub fn router(limiter: &RateLimiterState) -> Router<AppState> {
    Router::new().route(
        "/create",
        post(create).layer(middleware::from_fn_with_state(
            limiter.clone(),
            rate_limit_write_middleware,
        )),
    )
}
