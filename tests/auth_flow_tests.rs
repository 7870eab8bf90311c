//! Account lifecycle tests
//!
//! Full signup -> verify -> login flows against the in-memory store with a
//! deterministic OTP source, including attempt lockout, expiry, and the
//! resend cooldown.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};

use pictofold_server::auth::{verify_token, AccountService, AuthFlowError};
use pictofold_server::models::PendingOtp;
use pictofold_server::store::{AccountStore, InMemoryAccountStore};

use common::{account_service, RecordingMailer, SequenceOtpGenerator, TEST_JWT_SECRET};

struct Harness {
    store: Arc<InMemoryAccountStore>,
    mailer: Arc<RecordingMailer>,
    service: AccountService,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryAccountStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let service = account_service(
        store.clone(),
        mailer.clone(),
        Arc::new(SequenceOtpGenerator::new()),
    );
    Harness {
        store,
        mailer,
        service,
    }
}

/// Rewrite the stored OTP challenge timestamps through the store API
async fn rewrite_otp(store: &InMemoryAccountStore, email: &str, f: impl FnOnce(&mut PendingOtp)) {
    let mut account = store.find_by_email(email).await.unwrap().unwrap();
    let mut otp = account.pending_otp.clone().expect("no pending OTP");
    f(&mut otp);
    account.pending_otp = Some(otp);
    store.update(account).await.unwrap();
}

#[tokio::test]
async fn test_signup_persists_unverified_account_with_otp() {
    let h = harness();
    h.service.signup("alice", "A@B.com", "pw1").await.unwrap();

    // Identity key is the normalized email
    let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(account.username, "alice");
    assert!(!account.email_verified);

    let otp = account.pending_otp.expect("signup must issue an OTP");
    assert_eq!(otp.attempts, 0);

    let expected_expiry = Utc::now() + Duration::minutes(10);
    let delta = (otp.expires_at - expected_expiry).num_seconds().abs();
    assert!(delta <= 5, "OTP expiry should be about 10 minutes out");
}

#[tokio::test]
async fn test_signup_rejects_duplicate_normalized_email() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();

    let err = h
        .service
        .signup("bob", "  A@B.COM ", "pw2")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFlowError::EmailTaken));
}

#[tokio::test]
async fn test_login_before_verification_rejected_without_mutation() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();
    let before = h.store.find_by_email("a@b.com").await.unwrap().unwrap();

    // A correct password does not get past the verification gate
    let err = h.service.login("a@b.com", "pw1").await.unwrap_err();
    assert!(matches!(err, AuthFlowError::EmailNotVerified));

    let after = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert!(after.last_login_at.is_none());
    assert_eq!(after.version, before.version);
}

#[tokio::test]
async fn test_login_distinguishes_unknown_user_and_wrong_password() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();

    let err = h.service.login("nobody@b.com", "pw1").await.unwrap_err();
    assert!(matches!(err, AuthFlowError::UserNotFound));

    let err = h.service.login("a@b.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthFlowError::IncorrectPassword));
}

#[tokio::test]
async fn test_verify_and_login_issue_valid_token() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();

    h.service
        .verify_otp("a@b.com", &SequenceOtpGenerator::expected(1))
        .await
        .unwrap();

    // Verified accounts carry no live OTP secret
    let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert!(account.email_verified);
    assert!(account.pending_otp.is_none());

    let outcome = h.service.login("a@b.com", "pw1").await.unwrap();
    let claims = verify_token(&outcome.token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, "a@b.com");

    let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert!(account.last_login_at.is_some());
}

#[tokio::test]
async fn test_second_verify_reports_already_verified() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();

    let code = SequenceOtpGenerator::expected(1);
    h.service.verify_otp("a@b.com", &code).await.unwrap();

    let err = h.service.verify_otp("a@b.com", &code).await.unwrap_err();
    assert!(matches!(err, AuthFlowError::AlreadyVerified));
}

#[tokio::test]
async fn test_wrong_code_burns_attempts_until_lockout() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();

    for i in 1..=5 {
        let err = h.service.verify_otp("a@b.com", "999999").await.unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidOtp));

        let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(account.pending_otp.unwrap().attempts, i);
    }

    // Sixth attempt with the true code still fails while locked
    let err = h
        .service
        .verify_otp("a@b.com", &SequenceOtpGenerator::expected(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFlowError::TooManyAttempts));

    // Lockout does not burn further attempts
    let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(account.pending_otp.unwrap().attempts, 5);
}

#[tokio::test]
async fn test_correct_code_after_expiry_reports_expired() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();

    rewrite_otp(&h.store, "a@b.com", |otp| {
        otp.expires_at = Utc::now() - Duration::seconds(1);
    })
    .await;

    let err = h
        .service
        .verify_otp("a@b.com", &SequenceOtpGenerator::expected(1))
        .await
        .unwrap_err();
    assert!(
        matches!(err, AuthFlowError::OtpExpired),
        "a matching code past expiry must report expired, not invalid"
    );

    // No attempt is burned on an expired challenge
    let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(account.pending_otp.unwrap().attempts, 0);
}

#[tokio::test]
async fn test_resend_within_cooldown_rejected_without_mutation() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();
    let before = h.store.find_by_email("a@b.com").await.unwrap().unwrap();

    let err = h.service.resend_otp("a@b.com").await.unwrap_err();
    assert!(matches!(err, AuthFlowError::ResendCooldown));

    let after = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(after.version, before.version);
}

#[tokio::test]
async fn test_resend_after_cooldown_resets_and_invalidates_old_code() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();

    // Burn some attempts, then age the last send past the cooldown
    for _ in 0..3 {
        let _ = h.service.verify_otp("a@b.com", "999999").await;
    }
    rewrite_otp(&h.store, "a@b.com", |otp| {
        otp.last_sent_at = Utc::now() - Duration::seconds(61);
    })
    .await;

    h.service.resend_otp("a@b.com").await.unwrap();

    let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(account.pending_otp.as_ref().unwrap().attempts, 0);

    // The old code no longer verifies
    let err = h
        .service
        .verify_otp("a@b.com", &SequenceOtpGenerator::expected(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFlowError::InvalidOtp));

    // The fresh one does
    h.service
        .verify_otp("a@b.com", &SequenceOtpGenerator::expected(2))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_resend_rejected_once_verified() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();
    h.service
        .verify_otp("a@b.com", &SequenceOtpGenerator::expected(1))
        .await
        .unwrap();

    let err = h.service.resend_otp("a@b.com").await.unwrap_err();
    assert!(matches!(err, AuthFlowError::AlreadyVerified));
}

#[tokio::test]
async fn test_otp_email_dispatch_is_best_effort_and_recorded() {
    let h = harness();
    h.service.signup("alice", "a@b.com", "pw1").await.unwrap();

    // Dispatch runs on a detached task; give it a moment
    for _ in 0..50 {
        if !h.mailer.sent.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let sent = h.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "a@b.com");
    assert_eq!(sent[0].1, SequenceOtpGenerator::expected(1));
}

/// End-to-end walk: signup, five wrong codes, lockout beats the true code,
/// resend after cooldown recovers, fresh code verifies.
#[tokio::test]
async fn test_full_lockout_and_recovery_scenario() {
    let h = harness();
    h.service.signup("alice", "A@B.com", "pw1").await.unwrap();
    assert!(h.store.exists_by_email("a@b.com").await.unwrap());

    for _ in 0..5 {
        let err = h.service.verify_otp("a@b.com", "424242").await.unwrap_err();
        assert!(matches!(err, AuthFlowError::InvalidOtp));
    }
    let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(account.pending_otp.unwrap().attempts, 5);

    let err = h
        .service
        .verify_otp("a@b.com", &SequenceOtpGenerator::expected(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFlowError::TooManyAttempts));

    rewrite_otp(&h.store, "a@b.com", |otp| {
        otp.last_sent_at = Utc::now() - Duration::seconds(61);
    })
    .await;
    h.service.resend_otp("a@b.com").await.unwrap();

    let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(account.pending_otp.unwrap().attempts, 0);

    h.service
        .verify_otp("a@b.com", &SequenceOtpGenerator::expected(2))
        .await
        .unwrap();

    let account = h.store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert!(account.email_verified);
    assert!(account.pending_otp.is_none());
}
