//! Request extractors.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use taisen_core::{Identity, Session};

/// Header carrying an anonymous client's session key.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Caller session. Anonymous when the auth middleware attached no identity.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<Identity>()
                .copied()
                .map_or_else(Session::anonymous, Session::from),
        ))
    }
}

/// Key under which per-session state is remembered.
///
/// Signed-in callers are keyed by user ID, others by the `x-session-id`
/// header. `None` when neither is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(pub Option<String>);

impl<S> FromRequestParts<S> for SessionKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(Self(Some(format!("user:{}", identity.user_id))));
        }

        Ok(Self(
            parts
                .headers
                .get(SESSION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty() && v.len() <= 128)
                .map(|v| format!("session:{v}")),
        ))
    }
}
