//! Authentication middleware
//!
//! Middleware for bearer token verification and identity extraction.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{verify_token, AccountService, JwtError};
use crate::models::UserRole;

/// Authenticated identity extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Normalized email, the identity key
    pub email: String,
    pub role: UserRole,
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthRejection {
    error: AuthRejectionDetails,
}

#[derive(Debug, Serialize)]
struct AuthRejectionDetails {
    code: String,
    message: String,
}

impl AuthRejection {
    fn new(code: &str, message: &str) -> Self {
        Self {
            error: AuthRejectionDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Extractor for authenticated identities.
///
/// Verifies the bearer token from the Authorization header; validation is
/// purely cryptographic, no store lookup.
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AccountService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthRejection::new(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let account_service = Arc::<AccountService>::from_ref(state);

        let claims =
            verify_token(bearer.token(), account_service.jwt_secret()).map_err(|e| {
                let (code, message) = match e {
                    JwtError::TokenExpired => ("TOKEN_EXPIRED", "Token has expired"),
                    _ => ("INVALID_TOKEN", "Invalid token"),
                };
                AuthRejection::new(code, message).into_response()
            })?;

        let role = claims.role().map_err(|_| {
            AuthRejection::new("INVALID_TOKEN", "Invalid role in token").into_response()
        })?;

        Ok(AuthenticatedUser {
            email: claims.sub,
            role,
        })
    }
}
