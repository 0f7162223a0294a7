//! Outbound email
//!
//! Handlers only depend on the [`Mailer`] trait. [`LogMailer`] writes each
//! message to the log instead of sending it; [`MemoryMailer`] keeps them in
//! memory so tests can read verification keys back.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

pub const VERIFICATION_SUBJECT: &str = "Verify your email address";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to send email to {to}: {reason}")]
    Send { to: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    /// Message carrying an email verification link
    pub fn verification(from: &str, to: &str, base_url: &str, key: &str) -> Self {
        let link = format!("{}/v1/verify-email/{key}", base_url.trim_end_matches('/'));
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: VERIFICATION_SUBJECT.to_string(),
            body: format!(
                "Confirm your address by sending a POST request to {link}\n\
                 The link is valid for 24 hours."
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Logs every message at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "Email sent"
        );
        Ok(())
    }
}

/// Keeps sent messages in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<Email>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn last_to(&self, to: &str) -> Option<Email> {
        self.sent().into_iter().rev().find(|email| email.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let mut sent = self.sent.lock().map_err(|_| MailError::Send {
            to: email.to.clone(),
            reason: "mailbox lock poisoned".to_string(),
        })?;
        sent.push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email_link() {
        let email = Email::verification(
            "noreply@todo.app",
            "user@example.com",
            "https://todo.app/",
            "abc123",
        );
        assert_eq!(email.subject, VERIFICATION_SUBJECT);
        assert!(email.body.contains("https://todo.app/v1/verify-email/abc123"));
    }

    #[tokio::test]
    async fn test_memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();
        let email = Email::verification("a@x", "b@y", "http://localhost", "k1");
        mailer.send(email.clone()).await.unwrap();

        assert_eq!(mailer.sent(), vec![email.clone()]);
        assert_eq!(mailer.last_to("b@y"), Some(email));
        assert_eq!(mailer.last_to("nobody@y"), None);
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let email = Email::verification("a@x", "b@y", "http://localhost", "k1");
        assert!(LogMailer.send(email).await.is_ok());
    }
}
