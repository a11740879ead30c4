//! HTTP API layer for TAISEN.
//!
//! - **Endpoints**: JSON-over-POST routes under `/api`
//! - **Extractors**: caller session and session key
//! - **Middleware**: bearer token authentication, rate limiting
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod auth;
pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod ranking_session;
pub mod rate_limit;
pub mod response;

pub use auth::TokenVerifier;
pub use endpoints::router;
pub use ranking_session::RankingFilterStore;
pub use rate_limit::{RateLimiter, RateLimiterState};
