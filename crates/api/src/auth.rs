//! Bearer token verification.
//!
//! Tokens are issued by the external identity provider and signed with a
//! shared HS256 secret. Only the subject is used; the admin flag is looked
//! up from the profile table.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use taisen_common::{AppError, AppResult, config::AuthConfig};
use uuid::Uuid;

/// Claims read from an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    /// Audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verifies access tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("audience", &self.validation.aud)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Create a verifier for HS256 tokens with the given audience.
    #[must_use]
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Create a verifier from configuration.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, &config.audience)
    }

    /// Verify a token and return its subject.
    pub fn verify(&self, token: &str) -> AppResult<Uuid> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AppError::Unauthorized
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, sub: &str, aud: &str, exp_offset: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + exp_offset;
        let claims = Claims {
            sub: sub.to_string(),
            exp: u64::try_from(exp).unwrap(),
            aud: Some(aud.to_string()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token() {
        let verifier = TokenVerifier::new("secret", "authenticated");
        let user = Uuid::new_v4();

        let sub = verifier
            .verify(&token("secret", &user.to_string(), "authenticated", 3600))
            .unwrap();

        assert_eq!(sub, user);
    }

    #[test]
    fn test_rejects_wrong_secret_audience_and_expiry() {
        let verifier = TokenVerifier::new("secret", "authenticated");
        let user = Uuid::new_v4().to_string();

        assert!(verifier.verify(&token("other", &user, "authenticated", 3600)).is_err());
        assert!(verifier.verify(&token("secret", &user, "anon", 3600)).is_err());
        assert!(verifier.verify(&token("secret", &user, "authenticated", -3600)).is_err());
        assert!(verifier.verify("not-a-token").is_err());
    }

    #[test]
    fn test_rejects_non_uuid_subject() {
        let verifier = TokenVerifier::new("secret", "authenticated");

        let result = verifier.verify(&token("secret", "user-1", "authenticated", 3600));

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
