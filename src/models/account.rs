//! Account models and auth request/response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(UserRole::User),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

/// Live OTP challenge attached to an unverified account.
///
/// The whole sub-record is dropped once the email is verified, so a
/// verified account can never carry a stale OTP secret, and an OTP hash
/// can never exist without its expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOtp {
    /// Bcrypt digest of the 6-digit code. The plaintext code only exists
    /// transiently on the email dispatch path.
    pub otp_hash: String,
    pub expires_at: DateTime<Utc>,
    /// Failed verification attempts within this OTP cycle.
    pub attempts: u32,
    pub last_sent_at: DateTime<Utc>,
}

/// A user account.
///
/// `email` is the identity key: trimmed and lowercased before any lookup
/// or insert, unique across all accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub role: UserRole,
    pub pending_otp: Option<PendingOtp>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency token, bumped on every store update.
    pub version: i64,
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Signup request body
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Username cannot be empty!"))]
    pub username: String,
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty!"))]
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OTP verification request body
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// OTP resend request body
#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

/// Login response: token on success, message either way
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub message: String,
}

/// Generic success/message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
