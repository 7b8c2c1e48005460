//! JWT authentication module.
//!
//! Tokens are issued by the storefront's auth service and carry the
//! caller's numeric user id. This server only verifies them.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use shopkeep_core::ActorId;

use crate::error::ApiError;
use crate::AppState;

/// Default token lifetime used by [`JwtVerifier::issue`].
pub const TOKEN_LIFETIME_MINUTES: i64 = 30;

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id; becomes the checkout actor
    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// HS256 token verifier.
#[derive(Clone)]
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        JwtVerifier {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a token for `actor_id`. Used by tooling and tests.
    pub fn issue(&self, actor_id: ActorId, role: Option<&str>) -> Result<String, ApiError> {
        let claims = Claims {
            id: actor_id.get(),
            username: None,
            role: role.map(str::to_string),
            exp: (Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {e}")))
    }

    /// Validate and decode a token.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected bearer token");
                ApiError::unauthorized("Invalid or expired token")
            })
    }
}

/// Extract bearer token from the authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();

    (!token.is_empty()).then_some(token)
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub ActorId);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let claims = state.jwt.verify(token)?;
        Ok(Actor(ActorId(claims.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_jwt_roundtrip() {
        let verifier = JwtVerifier::new("test-secret");

        let token = verifier.issue(ActorId(7), Some("user")).unwrap();
        let claims = verifier.verify(&token).unwrap();

        assert_eq!(claims.id, 7);
        assert_eq!(claims.role.as_deref(), Some("user"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtVerifier::new("one").issue(ActorId(1), None).unwrap();
        let err = JwtVerifier::new("two").verify(&token).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = JwtVerifier::new("test-secret");
        let claims = Claims {
            id: 1,
            username: Some("ana".to_string()),
            role: None,
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &verifier.encoding).unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));
    }
}
