use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub church_id: Uuid,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
}

/// A stored assignment slot on an event. Individual rows carry a user id,
/// group rows carry a group id and no user id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AssignmentRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub role_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentTarget {
    Individual(Uuid),
    Group(Uuid),
}

impl AssignmentRow {
    pub fn target(&self) -> Option<AssignmentTarget> {
        match (self.user_id, self.group_id) {
            (Some(user_id), _) => Some(AssignmentTarget::Individual(user_id)),
            (None, Some(group_id)) => Some(AssignmentTarget::Group(group_id)),
            (None, None) => None,
        }
    }
}

/// Contact details and notification preferences for one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RecipientProfile {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub email_enabled: bool,
    pub digest_enabled: bool,
    pub timezone: Option<String>,
}
