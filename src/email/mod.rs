//! OTP email delivery
//!
//! Delivery is best-effort: the account service dispatches sends on a
//! detached task and only logs failures, so a mail outage never fails a
//! signup or resend.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Mail delivery errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail API rejected the request: {0}")]
    Rejected(String),
}

/// Delivers an OTP code to a user-controlled address
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp_email(&self, to: &str, code: &str) -> Result<(), MailError>;
}

const OTP_SUBJECT: &str = "Your PictoFold Verification Code";
const MAIL_AUTH_HEADER: &str = "X-Postmark-Server-Token";

fn otp_body(code: &str) -> String {
    format!("Your OTP verification code is: {code}\n\nThis code expires in 10 minutes.")
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
}

/// Postmark-style HTTP mail API client
pub struct HttpMailer {
    http_client: Client,
    base_url: String,
    server_token: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(base_url: String, server_token: String, sender: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            server_token,
            sender,
        }
    }
}

#[async_trait]
impl OtpMailer for HttpMailer {
    async fn send_otp_email(&self, to: &str, code: &str) -> Result<(), MailError> {
        let url = format!("{}/email", self.base_url.trim_end_matches('/'));
        let body = otp_body(code);

        let request_body = SendEmailRequest {
            from: &self.sender,
            to,
            subject: OTP_SUBJECT,
            text_body: &body,
        };

        self.http_client
            .post(url)
            .header(MAIL_AUTH_HEADER, &self.server_token)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| MailError::Rejected(e.to_string()))?;

        Ok(())
    }
}

/// Development mailer: logs that a code was issued without printing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_otp_email(&self, to: &str, _code: &str) -> Result<(), MailError> {
        // The code itself is never logged
        tracing::info!(recipient = %to, "OTP email suppressed (no mail token configured)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_body_contains_code_and_expiry() {
        let body = otp_body("123456");
        assert!(body.contains("123456"));
        assert!(body.contains("expires in 10 minutes"));
    }
}
