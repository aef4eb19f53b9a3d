use crate::delivery::{EmailSender, ReminderEmail};
use crate::error::{AppError, Result};
use crate::event::{Event, RecipientProfile};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tokio::sync::Mutex;
use uuid::Uuid;

pub fn event_starting_at(start_time: DateTime<Utc>) -> Event {
    Event {
        id: Uuid::new_v4(),
        church_id: Uuid::new_v4(),
        name: "Sunday Service".to_string(),
        start_time,
        end_time: start_time + Duration::hours(2),
        location: Some("Main Sanctuary".to_string()),
    }
}

pub fn profile(email: &str) -> RecipientProfile {
    RecipientProfile {
        user_id: Uuid::new_v4(),
        name: email.split('@').next().unwrap_or(email).to_string(),
        email: email.to_string(),
        email_enabled: true,
        digest_enabled: true,
        timezone: None,
    }
}

/// Records every email and fails for chosen addresses.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<ReminderEmail>>,
    failing: Mutex<HashSet<String>>,
    delay: Option<std::time::Duration>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps before every send to widen race windows.
    pub fn with_delay(delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn fail_for(&self, email: &str) {
        self.failing.lock().await.insert(email.to_string());
    }

    pub async fn sent(&self) -> Vec<ReminderEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, email: &ReminderEmail) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().await.contains(&email.to_email) {
            return Err(AppError::Email(format!("relay rejected {}", email.to_email)));
        }
        self.sent.lock().await.push(email.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
