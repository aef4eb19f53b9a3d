use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Template data handed to the email collaborator. Rendering happens on its side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderEmail {
    pub to_email: String,
    pub to_name: String,
    pub event_id: Uuid,
    pub event_name: String,
    pub start_time: DateTime<Utc>,
    pub location: Option<String>,
    pub offset_hours: i32,
    pub role_name: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &ReminderEmail) -> Result<()>;

    /// Get the sender name for logging.
    fn name(&self) -> &'static str;
}

/// Posts reminder payloads as JSON to an email relay.
#[derive(Clone)]
pub struct WebhookEmailSender {
    client: reqwest::Client,
    url: String,
}

impl WebhookEmailSender {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build email client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl EmailSender for WebhookEmailSender {
    async fn send(&self, email: &ReminderEmail) -> Result<()> {
        self.client
            .post(&self.url)
            .json(email)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Logs instead of sending. Used when no relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, email: &ReminderEmail) -> Result<()> {
        info!(
            to = %email.to_email,
            event_id = %email.event_id,
            offset_hours = email.offset_hours,
            "Reminder for '{}' (email relay not configured)",
            email.event_name
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
