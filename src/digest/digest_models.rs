use crate::delivery::NotificationKind;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A deferred end-of-day digest, pending until the digest worker sets `sent_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DigestJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub church_id: Uuid,
    pub kind: NotificationKind,
    /// Calendar day in the recipient's timezone; one pending job per user, event and day.
    pub digest_date: NaiveDate,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl DigestJob {
    pub fn is_pending(&self) -> bool {
        self.sent_at.is_none()
    }

    pub fn same_slot(&self, other: &DigestJob) -> bool {
        self.user_id == other.user_id
            && self.event_id == other.event_id
            && self.kind == other.kind
            && self.digest_date == other.digest_date
    }
}
