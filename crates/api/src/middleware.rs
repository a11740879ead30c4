//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use taisen_core::{
    CatalogService, FightCardService, FighterRequestService, Identity, TallyService, Top4Service,
};
use taisen_db::repositories::ProfileRepository;

use crate::auth::TokenVerifier;
use crate::ranking_session::RankingFilterStore;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub tally_service: TallyService,
    pub fight_card_service: FightCardService,
    pub fighter_request_service: FighterRequestService,
    pub top4_service: Top4Service,
    pub catalog_service: CatalogService,
    pub profile_repo: ProfileRepository,
    pub token_verifier: TokenVerifier,
    pub ranking_filters: RankingFilterStore,
}

/// Authentication middleware.
///
/// Attaches an [`Identity`] for a valid bearer token. Requests without one
/// continue anonymously; each service decides whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user_id) = state.token_verifier.verify(token)
    {
        let is_admin = match state.profile_repo.is_admin(user_id).await {
            Ok(is_admin) => is_admin,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Failed to load admin flag");
                false
            }
        };
        req.extensions_mut().insert(Identity { user_id, is_admin });
    }

    next.run(req).await
}
