//! Bearer token authentication.
//!
//! Token verification is consumed as an opaque capability: a valid token
//! resolves to a user id, nothing more. Company membership and role are
//! looked up separately through the tenant directory.

use crate::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user id).
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Extractor for the authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!("Missing or invalid Authorization header"))
            })?;

        let key =
            DecodingKey::from_secret(state.config.auth.jwt_secret.expose_secret().as_bytes());
        let token_data =
            decode::<AccessTokenClaims>(token, &key, &Validation::new(Algorithm::HS256))
                .map_err(|e| {
                    tracing::debug!(error = %e, "Token validation failed");
                    AppError::AuthError(anyhow::anyhow!("Invalid or expired token"))
                })?;

        Ok(AuthenticatedUser {
            user_id: token_data.claims.sub,
        })
    }
}
