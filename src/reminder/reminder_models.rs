use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use utoipa::ToSchema;
use uuid::Uuid;

/// A church's enabled reminder offsets, in hours before the event starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderPolicy {
    pub church_id: Uuid,
    offsets: Vec<i32>,
}

impl ReminderPolicy {
    /// Offsets are deduplicated, negative values dropped, and the rest kept
    /// longest lead time first.
    pub fn new(church_id: Uuid, offsets: impl IntoIterator<Item = i32>) -> Self {
        let unique: BTreeSet<i32> = offsets.into_iter().filter(|hours| *hours >= 0).collect();
        Self {
            church_id,
            offsets: unique.into_iter().rev().collect(),
        }
    }

    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    OffsetExceedsLeadTime,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::OffsetExceedsLeadTime => write!(f, "offset exceeds remaining lead time"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReminderAction {
    SendNow {
        offset_hours: i32,
    },
    /// Due later; the periodic sweep re-evaluates the event until it falls inside the send window.
    Defer {
        offset_hours: i32,
        notify_at: DateTime<Utc>,
    },
    Skip {
        offset_hours: i32,
        reason: SkipReason,
    },
}

impl ReminderAction {
    pub fn offset_hours(&self) -> i32 {
        match self {
            ReminderAction::SendNow { offset_hours }
            | ReminderAction::Defer { offset_hours, .. }
            | ReminderAction::Skip { offset_hours, .. } => *offset_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_offsets_sorted_descending_and_unique() {
        let policy = ReminderPolicy::new(Uuid::new_v4(), vec![2, 168, 24, 2, -5]);
        assert_eq!(policy.offsets(), &[168, 24, 2]);
        assert!(!policy.is_empty());
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(
            SkipReason::OffsetExceedsLeadTime.to_string(),
            "offset exceeds remaining lead time"
        );
    }
}
