//! API endpoints.

mod admin;
mod catalog;
mod fight_cards;
mod fighter_requests;
mod top4;
mod votes;

use axum::Router;

use crate::middleware::AppState;
use crate::rate_limit::RateLimiterState;

pub use fight_cards::{RankingAllResponse, RankingResponse};
pub use votes::{TallyResponse, ToggleResponse};

/// Create the API router.
///
/// Write endpoints carry the tighter write limit from `limiter`.
pub fn router(limiter: &RateLimiterState) -> Router<AppState> {
    Router::new()
        .nest("/votes", votes::router(limiter))
        .nest("/fight-cards", fight_cards::router(limiter))
        .nest("/fighters", catalog::fighters_router())
        .nest("/organizations", catalog::organizations_router())
        .nest("/weight-classes", catalog::weight_classes_router())
        .nest("/fighter-requests", fighter_requests::router(limiter))
        .nest("/top4", top4::router(limiter))
        .nest("/admin", admin::router())
}
