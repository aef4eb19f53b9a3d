use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Which assignment made a user notifiable for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum RecipientSource {
    Individual { assignment_id: Uuid },
    Group { assignment_id: Uuid, group_id: Uuid },
}

/// A concrete user to notify for an event. Derived on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResolvedRecipient {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub source: RecipientSource,
    pub role_name: String,
}

impl ResolvedRecipient {
    pub fn is_via_group(&self) -> bool {
        matches!(self.source, RecipientSource::Group { .. })
    }
}
