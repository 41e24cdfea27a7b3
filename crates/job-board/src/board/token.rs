//! Bearer tokens carrying a user id, signed with the configured secret (HS256).

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::domain::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: String,
    iat: i64,
    exp: i64,
}

/// Why a request could not be tied to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("No token provided, authorization denied")]
    MissingToken,
    #[error("Token is invalid or expired")]
    InvalidToken,
    #[error("User not found")]
    UnknownUser,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to sign token: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

#[derive(Clone)]
pub struct TokenAuthority {
    secret: Arc<String>,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: &UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.0.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &key)?)
    }

    pub fn verify(&self, token: &str) -> Result<UserId, AuthFailure> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        decode::<Claims>(token, &key, &Validation::default())
            .map(|data| UserId(data.claims.user_id))
            .map_err(|err| {
                tracing::debug!(error = %err, "token rejected");
                AuthFailure::InvalidToken
            })
    }

    /// Pulls the token out of an `Authorization: Bearer <token>` header value.
    pub fn verify_header(&self, header: Option<&str>) -> Result<UserId, AuthFailure> {
        let token = header
            .and_then(|value| value.split_whitespace().nth(1))
            .ok_or(AuthFailure::MissingToken)?;
        self.verify(token)
    }
}
