use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Reminder,
    EventUpdateDigest,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Reminder => "reminder",
            NotificationKind::EventUpdateDigest => "event_update_digest",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only fact that one recipient was sent one reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NotificationDeliveryRecord {
    pub id: Uuid,
    pub event_id: Uuid,
    pub kind: NotificationKind,
    pub offset_hours: i32,
    pub recipient_id: Uuid,
    pub sent_at: DateTime<Utc>,
}

impl NotificationDeliveryRecord {
    pub fn reminder(event_id: Uuid, offset_hours: i32, recipient_id: Uuid, sent_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            kind: NotificationKind::Reminder,
            offset_hours,
            recipient_id,
            sent_at,
        }
    }
}

/// Audit trail row written next to every successful delivery.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Activity {
    pub id: Uuid,
    pub church_id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Key of the atomic send claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimKey {
    pub event_id: Uuid,
    pub kind: NotificationKind,
    pub offset_hours: i32,
}

impl ClaimKey {
    pub fn reminder(event_id: Uuid, offset_hours: i32) -> Self {
        Self {
            event_id,
            kind: NotificationKind::Reminder,
            offset_hours,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeliveryReport {
    pub offset_hours: i32,
    pub already_sent: bool,
    pub sent: usize,
    pub failed: usize,
    /// Recipients with no profile or with email turned off.
    pub skipped: usize,
}

impl DeliveryReport {
    pub fn already_sent(offset_hours: i32) -> Self {
        Self {
            offset_hours,
            already_sent: true,
            ..Default::default()
        }
    }
}
