//! Vote endpoints.

use axum::{Json, Router, extract::State, middleware, routing::post};
use serde::{Deserialize, Serialize};
use taisen_common::{AppError, AppResult};
use taisen_core::{PredictionSplit, Side, Tally, ToggleAction, ToggleOutcome, VoteChoice};
use taisen_db::entities::vote::{self, VoteType};

use crate::{
    extractors::CurrentSession,
    middleware::AppState,
    rate_limit::{RateLimiterState, rate_limit_write_middleware},
    response::ApiResponse,
};

/// Toggle vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleVoteRequest {
    pub fight_card_id: i32,
    pub vote_type: VoteType,
    /// `1` or `2`; required for predictions.
    pub side: Option<i16>,
}

impl ToggleVoteRequest {
    fn choice(&self) -> AppResult<VoteChoice> {
        match self.vote_type {
            VoteType::Popularity => Ok(VoteChoice::Popularity),
            VoteType::Prediction => self
                .side
                .and_then(Side::from_i16)
                .map(VoteChoice::Prediction)
                .ok_or_else(|| AppError::BadRequest("side must be 1 or 2".to_string())),
        }
    }
}

/// Counters with the derived prediction share.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyResponse {
    #[serde(flatten)]
    pub tally: Tally,
    pub prediction_split: PredictionSplit,
}

impl From<Tally> for TallyResponse {
    fn from(tally: Tally) -> Self {
        Self {
            prediction_split: tally.prediction_split(),
            tally,
        }
    }
}

/// Toggle result.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub action: ToggleAction,
    pub vote_type: VoteType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<i16>,
    pub tally: TallyResponse,
}

impl From<ToggleOutcome> for ToggleResponse {
    fn from(outcome: ToggleOutcome) -> Self {
        Self {
            action: outcome.action,
            vote_type: outcome.vote_type,
            side: outcome.side.map(Side::as_i16),
            tally: outcome.tally.into(),
        }
    }
}

/// Cast or cancel a vote.
async fn toggle(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<ToggleVoteRequest>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    let choice = req.choice()?;
    let outcome = state
        .tally_service
        .toggle_vote(&session, req.fight_card_id, choice)
        .await?;
    Ok(ApiResponse::ok(outcome.into()))
}

/// One of the caller's votes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub fight_card_id: i32,
    pub vote_type: VoteType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_for: Option<i16>,
    pub created_at: String,
}

impl From<vote::Model> for VoteResponse {
    fn from(v: vote::Model) -> Self {
        Self {
            fight_card_id: v.fight_card_id,
            vote_type: v.vote_type,
            vote_for: v.vote_for,
            created_at: v.created_at.to_rfc3339(),
        }
    }
}

/// The caller's votes.
async fn mine(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<VoteResponse>>> {
    let votes = state.tally_service.user_votes(&session).await?;
    Ok(ApiResponse::ok(votes.into_iter().map(Into::into).collect()))
}

/// Bulk popularity cancel request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelPopularityRequest {
    pub fight_card_ids: Vec<i32>,
}

/// Withdraw popularity votes from several cards.
async fn cancel_popularity(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<CancelPopularityRequest>,
) -> AppResult<ApiResponse<Vec<TallyResponse>>> {
    if req.fight_card_ids.len() > 100 {
        return Err(AppError::BadRequest(
            "At most 100 cards per request".to_string(),
        ));
    }
    let tallies = state
        .tally_service
        .cancel_popularity_votes(&session, &req.fight_card_ids)
        .await?;
    Ok(ApiResponse::ok(tallies.into_iter().map(Into::into).collect()))
}

/// Card lookup request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightCardIdRequest {
    pub fight_card_id: i32,
}

/// Current counters of a card.
async fn tally(
    State(state): State<AppState>,
    Json(req): Json<FightCardIdRequest>,
) -> AppResult<ApiResponse<TallyResponse>> {
    let tally = state.tally_service.tally(req.fight_card_id).await?;
    Ok(ApiResponse::ok(tally.into()))
}

pub fn router(limiter: &RateLimiterState) -> Router<AppState> {
    let write_limit =
        middleware::from_fn_with_state(limiter.clone(), rate_limit_write_middleware);

    Router::new()
        .route("/toggle", post(toggle).layer(write_limit.clone()))
        .route(
            "/popularity/cancel",
            post(cancel_popularity).layer(write_limit),
        )
        .route("/mine", post(mine))
        .route("/tally", post(tally))
}
