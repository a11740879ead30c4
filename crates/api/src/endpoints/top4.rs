//! Top 4 endpoints.

use axum::{Json, Router, extract::State, middleware, routing::post};
use serde::Deserialize;
use taisen_common::AppResult;
use taisen_core::{ClearTop4SlotInput, CommunityBoard, SaveTop4Input, Top4Board};
use taisen_db::entities::fighter::Gender;

use crate::{
    extractors::CurrentSession,
    middleware::AppState,
    rate_limit::{RateLimiterState, rate_limit_write_middleware},
    response::ApiResponse,
};

/// Board listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardsRequest {
    pub gender: Gender,
}

/// Save the caller's board for a weight class.
async fn save(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(input): Json<SaveTop4Input>,
) -> AppResult<ApiResponse<Top4Board>> {
    let board = state.top4_service.save(&session, input).await?;
    Ok(ApiResponse::ok(board))
}

/// Clear one slot of the caller's board.
async fn clear(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(input): Json<ClearTop4SlotInput>,
) -> AppResult<ApiResponse<()>> {
    state.top4_service.clear_slot(&session, input).await?;
    Ok(ApiResponse::ok(()))
}

/// The caller's boards.
async fn mine(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<BoardsRequest>,
) -> AppResult<ApiResponse<Vec<Top4Board>>> {
    let boards = state.top4_service.my_boards(&session, req.gender).await?;
    Ok(ApiResponse::ok(boards))
}

/// Most picked fighters across all users.
async fn community(
    State(state): State<AppState>,
    Json(req): Json<BoardsRequest>,
) -> AppResult<ApiResponse<Vec<CommunityBoard>>> {
    let boards = state.top4_service.community_boards(req.gender).await?;
    Ok(ApiResponse::ok(boards))
}

pub fn router(limiter: &RateLimiterState) -> Router<AppState> {
    let write_limit =
        middleware::from_fn_with_state(limiter.clone(), rate_limit_write_middleware);

    Router::new()
        .route("/save", post(save).layer(write_limit.clone()))
        .route("/clear", post(clear).layer(write_limit))
        .route("/mine", post(mine))
        .route("/community", post(community))
}
