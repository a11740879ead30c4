//! Fight card endpoints.

use axum::{Json, Router, extract::State, middleware, routing::post};
use serde::{Deserialize, Serialize};
use taisen_common::AppResult;
use taisen_core::{
    CreateFightCardInput, FightCardView, RankedCard, RankingFilter, RemainderPage,
    project_ranking,
};

use crate::{
    extractors::{CurrentSession, SessionKey},
    middleware::AppState,
    rate_limit::{RateLimiterState, rate_limit_write_middleware},
    response::ApiResponse,
};

use super::votes::FightCardIdRequest;

/// Propose a new matchup.
async fn create(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Json(input): Json<CreateFightCardInput>,
) -> AppResult<ApiResponse<FightCardView>> {
    let card = state.fight_card_service.create(&session, input).await?;
    Ok(ApiResponse::ok(card))
}

/// Show one card.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<FightCardIdRequest>,
) -> AppResult<ApiResponse<FightCardView>> {
    let card = state.fight_card_service.get(req.fight_card_id).await?;
    Ok(ApiResponse::ok(card))
}

/// Ranking page response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    pub filter: RankingFilter,
    pub total: usize,
    pub podium: Vec<RankedCard>,
    pub contenders: Vec<RankedCard>,
    /// First window of rank 11 onwards.
    pub remainder: RemainderPage,
}

/// Filtered ranking. The filter is remembered for the session.
async fn ranking(
    SessionKey(key): SessionKey,
    State(state): State<AppState>,
    Json(filter): Json<RankingFilter>,
) -> AppResult<ApiResponse<RankingResponse>> {
    let filter = filter.normalized();
    let cards = state.fight_card_service.list().await?;
    let projection = project_ranking(&cards, &filter);

    if let Some(key) = key {
        state.ranking_filters.remember(&key, filter.clone()).await;
    }

    Ok(ApiResponse::ok(RankingResponse {
        total: projection.len(),
        remainder: projection.remainder_page(0),
        podium: projection.podium,
        contenders: projection.contenders,
        filter,
    }))
}

/// "All rankings" request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingAllRequest {
    /// Remainder window, starting at 0.
    #[serde(default)]
    pub page: usize,
    /// Overrides the remembered filter when present.
    pub filter: Option<RankingFilter>,
}

/// "All rankings" response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingAllResponse {
    pub filter: RankingFilter,
    pub total: usize,
    #[serde(flatten)]
    pub page: RemainderPage,
}

/// Ranks 11 onwards, continuing the session's last filter.
async fn ranking_all(
    SessionKey(key): SessionKey,
    State(state): State<AppState>,
    Json(req): Json<RankingAllRequest>,
) -> AppResult<ApiResponse<RankingAllResponse>> {
    let filter = match (req.filter, key.as_deref()) {
        (Some(filter), Some(key)) => {
            let filter = filter.normalized();
            state.ranking_filters.remember(key, filter.clone()).await;
            filter
        }
        (Some(filter), None) => filter.normalized(),
        (None, Some(key)) => state.ranking_filters.recall(key).await.unwrap_or_default(),
        (None, None) => RankingFilter::default(),
    };

    let cards = state.fight_card_service.list().await?;
    let projection = project_ranking(&cards, &filter);

    Ok(ApiResponse::ok(RankingAllResponse {
        total: projection.len(),
        page: projection.remainder_page(req.page),
        filter,
    }))
}

/// Cards the caller has popularity-voted.
async fn voted(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<FightCardView>>> {
    let cards = state.fight_card_service.voted_cards(&session).await?;
    Ok(ApiResponse::ok(cards))
}

pub fn router(limiter: &RateLimiterState) -> Router<AppState> {
    Router::new()
        .route(
            "/create",
            post(create).layer(middleware::from_fn_with_state(
                limiter.clone(),
                rate_limit_write_middleware,
            )),
        )
        .route("/show", post(show))
        .route("/ranking", post(ranking))
        .route("/ranking/all", post(ranking_all))
        .route("/voted", post(voted))
}
