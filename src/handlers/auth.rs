//! Authentication HTTP handlers
//!
//! Endpoints for signup, login, OTP verification and OTP resend.

use axum::{extract::State, Json};
use validator::Validate;

use crate::auth::AuthFlowError;
use crate::error::ApiError;
use crate::models::{
    AuthResponse, LoginRequest, MessageResponse, ResendOtpRequest, SignupRequest, VerifyOtpRequest,
};
use crate::state::AppState;

impl From<AuthFlowError> for ApiError {
    fn from(err: AuthFlowError) -> Self {
        let message = err.to_string();
        match err {
            AuthFlowError::EmptyUsername | AuthFlowError::EmptyPassword => {
                ApiError::ValidationError(message)
            }
            AuthFlowError::EmailTaken | AuthFlowError::AlreadyVerified => {
                ApiError::Conflict(message)
            }
            AuthFlowError::UserNotFound => ApiError::NotFound(message),
            AuthFlowError::IncorrectPassword
            | AuthFlowError::EmailNotVerified
            | AuthFlowError::OtpExpired
            | AuthFlowError::InvalidOtp => ApiError::Unauthorized(message),
            AuthFlowError::TooManyAttempts | AuthFlowError::ResendCooldown => {
                ApiError::TooManyRequests(message)
            }
            AuthFlowError::Store(e) => ApiError::DatabaseError(e.to_string()),
            AuthFlowError::Hash(e) => ApiError::InternalError(e),
            AuthFlowError::Token(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

/// POST /api/auth/signup - Register an account and dispatch its first OTP
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    req.validate()?;

    state
        .account_service
        .signup(&req.username, &req.email, &req.password)
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "OTP sent to your email".to_string(),
    }))
}

/// POST /api/auth/login - Authenticate credentials and issue a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let outcome = state.account_service.login(&req.email, &req.password).await?;

    Ok(Json(AuthResponse {
        token: Some(outcome.token),
        message: "Login successful!".to_string(),
    }))
}

/// POST /api/auth/verify-otp - Prove email ownership with an OTP code
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.account_service.verify_otp(&req.email, &req.otp).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Email verified successfully".to_string(),
    }))
}

/// POST /api/auth/resend-otp - Issue a fresh OTP, subject to the cooldown
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(req): Json<ResendOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.account_service.resend_otp(&req.email).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "OTP resent successfully".to_string(),
    }))
}
