//! Account lifecycle service
//!
//! Core business logic for signup, login, OTP verification and OTP resend.
//! Accounts move `unverified (pending OTP) -> verified`; verification is
//! terminal. Every mutation goes through the store's version-checked update
//! and is retried on conflict, so parallel requests against the same
//! account cannot lose attempt counts or verification flips.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, PendingOtp, UserRole};
use crate::store::{AccountStore, StoreError};
use crate::email::OtpMailer;

use super::jwt::{issue_token, JwtError};
use super::otp::OtpGenerator;
use super::password::{hash_secret, verify_secret};

/// How long an issued OTP stays valid
pub const OTP_EXPIRY_MINUTES: i64 = 10;
/// Failed verifications allowed per OTP cycle before a resend is required
pub const MAX_OTP_ATTEMPTS: u32 = 5;
/// Minimum interval between OTP dispatches to the same account
pub const RESEND_COOLDOWN_SECONDS: i64 = 60;
/// Declared resend policy; no rolling counter enforces it yet
#[allow(dead_code)]
pub const MAX_RESENDS_PER_HOUR: u32 = 5;

/// Bounded re-read-and-retry on store version conflicts
const UPDATE_RETRIES: usize = 3;

/// Account lifecycle errors, surfaced to callers as structured rejections
#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("Username cannot be empty!")]
    EmptyUsername,

    #[error("Password cannot be empty!")]
    EmptyPassword,

    #[error("Email already registered!")]
    EmailTaken,

    #[error("User not found!")]
    UserNotFound,

    #[error("Incorrect password!")]
    IncorrectPassword,

    #[error("Please verify your email first")]
    EmailNotVerified,

    #[error("Email already verified!")]
    AlreadyVerified,

    #[error("OTP expired!")]
    OtpExpired,

    #[error("Too many failed attempts. Please request a new OTP.")]
    TooManyAttempts,

    #[error("Invalid OTP!")]
    InvalidOtp,

    #[error("Please wait before resending OTP.")]
    ResendCooldown,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Credential hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl From<bcrypt::BcryptError> for AuthFlowError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AuthFlowError::Hash(e.to_string())
    }
}

/// Successful login result
#[derive(Debug)]
pub struct LoginSuccess {
    pub token: String,
}

/// The identity key: trimmed, lowercased email. All lookups and inserts go
/// through this form.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account lifecycle service
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn OtpMailer>,
    otp_generator: Arc<dyn OtpGenerator>,
    jwt_secret: String,
    jwt_ttl_seconds: i64,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn OtpMailer>,
        otp_generator: Arc<dyn OtpGenerator>,
        jwt_secret: String,
        jwt_ttl_seconds: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            mailer,
            otp_generator,
            jwt_secret,
            jwt_ttl_seconds,
            bcrypt_cost,
        }
    }

    /// Get JWT secret (for middleware access)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Register a new account and dispatch its first OTP.
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthFlowError> {
        let email = normalize_email(email);
        let username = username.trim();

        if username.is_empty() {
            return Err(AuthFlowError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(AuthFlowError::EmptyPassword);
        }

        if self.store.exists_by_email(&email).await? {
            return Err(AuthFlowError::EmailTaken);
        }

        let password_hash = hash_secret(password, self.bcrypt_cost)?;

        let code = self.otp_generator.generate();
        let otp_hash = hash_secret(&code, self.bcrypt_cost)?;

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.clone(),
            password_hash,
            email_verified: false,
            role: UserRole::User,
            pending_otp: Some(PendingOtp {
                otp_hash,
                expires_at: now + Duration::minutes(OTP_EXPIRY_MINUTES),
                attempts: 0,
                last_sent_at: now,
            }),
            last_login_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        // The store enforces identity-key uniqueness; a racing signup for
        // the same email loses here even though the exists check passed.
        self.store.insert(account).await.map_err(|e| match e {
            StoreError::Duplicate => AuthFlowError::EmailTaken,
            other => AuthFlowError::Store(other),
        })?;

        self.dispatch_otp(email, code);

        Ok(())
    }

    /// Authenticate credentials and issue a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSuccess, AuthFlowError> {
        let email = normalize_email(email);

        for _ in 0..UPDATE_RETRIES {
            let mut account = self
                .store
                .find_by_email(&email)
                .await?
                .ok_or(AuthFlowError::UserNotFound)?;

            if !verify_secret(password, &account.password_hash)? {
                return Err(AuthFlowError::IncorrectPassword);
            }

            if !account.email_verified {
                return Err(AuthFlowError::EmailNotVerified);
            }

            account.last_login_at = Some(Utc::now());

            match self.store.update(account).await {
                Ok(saved) => {
                    let token = issue_token(&saved, &self.jwt_secret, self.jwt_ttl_seconds)?;
                    tracing::info!(email = %saved.email, "login successful");
                    return Ok(LoginSuccess { token });
                }
                Err(StoreError::VersionConflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AuthFlowError::Store(StoreError::VersionConflict))
    }

    /// Verify an OTP code. Success flips the account to verified and clears
    /// the challenge; a mismatch burns one attempt.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<(), AuthFlowError> {
        let email = normalize_email(email);

        for _ in 0..UPDATE_RETRIES {
            let mut account = self
                .store
                .find_by_email(&email)
                .await?
                .ok_or(AuthFlowError::UserNotFound)?;

            if account.email_verified {
                return Err(AuthFlowError::AlreadyVerified);
            }

            // Unverified accounts always hold a challenge; should one be
            // missing, it behaves like an expired code and a resend recovers.
            let otp = account
                .pending_otp
                .clone()
                .ok_or(AuthFlowError::OtpExpired)?;

            let now = Utc::now();
            if otp.expires_at < now {
                return Err(AuthFlowError::OtpExpired);
            }

            if otp.attempts >= MAX_OTP_ATTEMPTS {
                return Err(AuthFlowError::TooManyAttempts);
            }

            if !verify_secret(code, &otp.otp_hash)? {
                account.pending_otp = Some(PendingOtp {
                    attempts: otp.attempts + 1,
                    ..otp
                });
                match self.store.update(account).await {
                    Ok(_) => return Err(AuthFlowError::InvalidOtp),
                    Err(StoreError::VersionConflict) => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            account.email_verified = true;
            account.pending_otp = None;

            match self.store.update(account).await {
                Ok(saved) => {
                    tracing::info!(email = %saved.email, "email verified");
                    return Ok(());
                }
                Err(StoreError::VersionConflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AuthFlowError::Store(StoreError::VersionConflict))
    }

    /// Issue a fresh OTP, subject to the resend cooldown. Invalidates any
    /// previous code and resets the attempt counter.
    pub async fn resend_otp(&self, email: &str) -> Result<(), AuthFlowError> {
        let email = normalize_email(email);

        for _ in 0..UPDATE_RETRIES {
            let mut account = self
                .store
                .find_by_email(&email)
                .await?
                .ok_or(AuthFlowError::UserNotFound)?;

            if account.email_verified {
                return Err(AuthFlowError::AlreadyVerified);
            }

            let now = Utc::now();
            if let Some(otp) = &account.pending_otp {
                // Boundary counts as still cooling down
                if otp.last_sent_at + Duration::seconds(RESEND_COOLDOWN_SECONDS) > now {
                    return Err(AuthFlowError::ResendCooldown);
                }
            }

            let code = self.otp_generator.generate();
            let otp_hash = hash_secret(&code, self.bcrypt_cost)?;

            account.pending_otp = Some(PendingOtp {
                otp_hash,
                expires_at: now + Duration::minutes(OTP_EXPIRY_MINUTES),
                attempts: 0,
                last_sent_at: now,
            });

            match self.store.update(account).await {
                Ok(saved) => {
                    self.dispatch_otp(saved.email, code);
                    return Ok(());
                }
                Err(StoreError::VersionConflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AuthFlowError::Store(StoreError::VersionConflict))
    }

    /// Best-effort OTP dispatch on a detached task. Delivery failure is
    /// logged and never propagates to the enclosing request.
    fn dispatch_otp(&self, to: String, code: String) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            match mailer.send_otp_email(&to, &code).await {
                Ok(()) => tracing::info!(recipient = %to, "OTP email sent"),
                Err(e) => {
                    tracing::error!(recipient = %to, error = %e, "failed to send OTP email");
                }
            }
        });
    }
}
