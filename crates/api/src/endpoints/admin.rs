//! Admin endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use taisen_common::AppResult;
use taisen_core::ReconcileReport;
use taisen_db::entities::fighter_request::RequestStatus;

use crate::{extractors::CurrentSession, middleware::AppState, response::ApiResponse};

use super::fighter_requests::FighterRequestResponse;
use super::votes::TallyResponse;

/// List fighter requests request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsRequest {
    #[serde(default)]
    pub status: Option<RequestStatus>,
}

/// Target a single fighter request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdRequest {
    pub request_id: i32,
}

// ========== Fighter Request Review ==========

/// List fighter requests (admin only).
async fn list_requests(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<ListRequestsRequest>,
) -> AppResult<ApiResponse<Vec<FighterRequestResponse>>> {
    let requests = state
        .fighter_request_service
        .list(&session, req.status)
        .await?;
    Ok(ApiResponse::ok(requests.into_iter().map(Into::into).collect()))
}

/// Approve a fighter request (admin only).
async fn approve_request(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<RequestIdRequest>,
) -> AppResult<ApiResponse<FighterRequestResponse>> {
    let request = state
        .fighter_request_service
        .approve(&session, req.request_id)
        .await?;
    Ok(ApiResponse::ok(request.into()))
}

/// Reject a fighter request (admin only).
async fn reject_request(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<RequestIdRequest>,
) -> AppResult<ApiResponse<FighterRequestResponse>> {
    let request = state
        .fighter_request_service
        .reject(&session, req.request_id)
        .await?;
    Ok(ApiResponse::ok(request.into()))
}

/// Delete a fighter request record (admin only).
async fn delete_request(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<RequestIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .fighter_request_service
        .delete(&session, req.request_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

// ========== Tally Maintenance ==========

/// Reconcile request. Without a card ID every card is checked.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    pub fight_card_id: Option<i32>,
}

/// Reconcile result.
#[derive(Serialize)]
#[serde(rename_all = "camelCase", tag = "scope")]
pub enum ReconcileResponse {
    Card { tally: TallyResponse },
    All { report: ReconcileReport },
}

/// Recompute counters from the vote ledger (admin only).
async fn reconcile(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<ReconcileRequest>,
) -> AppResult<ApiResponse<ReconcileResponse>> {
    let admin_id = session.require_admin()?;

    let response = match req.fight_card_id {
        Some(card_id) => ReconcileResponse::Card {
            tally: state.tally_service.reconcile_card(card_id).await?.into(),
        },
        None => ReconcileResponse::All {
            report: state.tally_service.reconcile_all().await?,
        },
    };

    tracing::info!(admin_id = %admin_id, card_id = ?req.fight_card_id, "Manual reconcile");
    Ok(ApiResponse::ok(response))
}

pub fn router() -> Router<AppState> {
    Router::new()
        // Fighter requests
        .route("/fighter-requests/list", post(list_requests))
        .route("/fighter-requests/approve", post(approve_request))
        .route("/fighter-requests/reject", post(reject_request))
        .route("/fighter-requests/delete", post(delete_request))
        // Tally
        .route("/tally/reconcile", post(reconcile))
}
