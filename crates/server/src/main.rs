//! TAISEN server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Json, Router, middleware, routing::get};
use serde_json::{Value, json};
use taisen_api::{
    RankingFilterStore, TokenVerifier, middleware::AppState, rate_limit::RateLimiterState,
    router as api_router,
};
use taisen_common::{Config, LocalDay};
use taisen_core::{
    CatalogService, DatabaseLedger, FightCardService, FighterRequestService, TallyService,
    Top4Service,
};
use taisen_db::repositories::{
    FightCardRepository, FighterRepository, FighterRequestRepository, OrganizationRepository,
    ProfileRepository, UserTop4Repository, VoteRepository, WeightClassRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Per-request deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taisen=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting TAISEN server...");

    let config = match std::env::var("TAISEN_CONFIG") {
        Ok(path) => Config::from_file(&path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        Err(_) => Config::load().context("failed to load configuration")?,
    };
    let day = LocalDay::from_config(&config.limits)?;

    let db = taisen_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    taisen_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let fight_card_repo = FightCardRepository::new(Arc::clone(&db));
    let fighter_repo = FighterRepository::new(Arc::clone(&db));
    let organization_repo = OrganizationRepository::new(Arc::clone(&db));
    let weight_class_repo = WeightClassRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let request_repo = FighterRequestRepository::new(Arc::clone(&db));
    let top4_repo = UserTop4Repository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));

    // Initialize services
    let ledger = Arc::new(DatabaseLedger::new(vote_repo.clone(), fight_card_repo.clone()));
    let tally_service = TallyService::new(ledger, config.limits.popularity_vote_cap);
    let fight_card_service = FightCardService::new(
        fight_card_repo,
        fighter_repo.clone(),
        organization_repo.clone(),
        weight_class_repo.clone(),
        vote_repo,
        day,
        config.limits.daily_fight_cards,
    );
    let fighter_request_service = FighterRequestService::new(
        request_repo,
        fighter_repo.clone(),
        day,
        config.limits.daily_fighter_requests,
        config.limits.fighter_name_max_len,
    );
    let top4_service = Top4Service::new(top4_repo, fighter_repo.clone(), weight_class_repo.clone());
    let catalog_service = CatalogService::new(fighter_repo, organization_repo, weight_class_repo);

    let ranking_filters = RankingFilterStore::default();
    let rate_limiter = RateLimiterState::new();

    let state = AppState {
        tally_service: tally_service.clone(),
        fight_card_service,
        fighter_request_service,
        top4_service,
        catalog_service,
        profile_repo,
        token_verifier: TokenVerifier::from_config(&config.auth),
        ranking_filters: ranking_filters.clone(),
    };

    // Periodic counter reconciliation
    if config.tally.reconcile_interval_secs > 0 {
        let period = Duration::from_secs(config.tally.reconcile_interval_secs);
        info!(interval_secs = period.as_secs(), "Starting counter reconciliation task");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = tally_service.reconcile_all().await {
                    tracing::error!(error = %e, "Counter reconciliation failed");
                }
            }
        });
    }

    // Housekeeping for in-memory session state
    {
        let ranking_filters = ranking_filters.clone();
        let rate_limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(300));
            loop {
                ticker.tick().await;
                ranking_filters.cleanup().await;
                rate_limiter.cleanup().await;
            }
        });
    }

    // Build router
    let app = Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_router(&rate_limiter))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            taisen_api::rate_limit::rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            taisen_api::middleware::auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
