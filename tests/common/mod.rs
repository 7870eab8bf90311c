//! Shared test doubles for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pictofold_server::auth::{AccountService, OtpGenerator};
use pictofold_server::email::{MailError, OtpMailer};
use pictofold_server::media::{MediaError, MediaHost, MediaUpload};
use pictofold_server::store::AccountStore;

/// Minimum bcrypt cost keeps the tests fast
pub const TEST_BCRYPT_COST: u32 = 4;
pub const TEST_JWT_SECRET: &str = "test-secret-key";
pub const TEST_JWT_TTL: i64 = 900;

/// Deterministic OTP source: 100001, 100002, ...
#[derive(Default)]
pub struct SequenceOtpGenerator {
    counter: AtomicU32,
}

impl SequenceOtpGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The nth code this generator hands out (1-based)
    pub fn expected(n: u32) -> String {
        (100_000 + n).to_string()
    }
}

impl OtpGenerator for SequenceOtpGenerator {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Self::expected(n)
    }
}

/// Mailer that records every dispatch
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpMailer for RecordingMailer {
    async fn send_otp_email(&self, to: &str, code: &str) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}

/// Media host double that records uploads and deletes
#[derive(Default)]
pub struct FakeMediaHost {
    counter: AtomicU32,
    pub uploads: Mutex<Vec<(usize, String, String)>>,
    pub deletes: Mutex<Vec<String>>,
}

impl FakeMediaHost {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload(
        &self,
        data: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<MediaUpload, MediaError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.uploads
            .lock()
            .unwrap()
            .push((data.len(), content_type.to_string(), folder.to_string()));

        let format = match content_type {
            "image/png" => "png",
            _ => "jpg",
        };

        Ok(MediaUpload {
            url: format!("https://media.test/{folder}/{n}.{format}"),
            public_id: format!("{folder}/{n}"),
            format: format.to_string(),
            bytes: data.len() as i64,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        self.deletes.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

/// Account service wired to the given store with deterministic test doubles
pub fn account_service(
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn OtpMailer>,
    generator: Arc<dyn OtpGenerator>,
) -> AccountService {
    AccountService::new(
        store,
        mailer,
        generator,
        TEST_JWT_SECRET.to_string(),
        TEST_JWT_TTL,
        TEST_BCRYPT_COST,
    )
}
