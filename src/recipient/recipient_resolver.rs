use crate::error::Result;
use crate::event::{AssignmentRow, AssignmentTarget, Event, EventStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::recipient_models::{RecipientSource, ResolvedRecipient};

/// Expands an event's assignment rows into the users to notify.
///
/// Individual assignments are emitted first, in row order. Group rows follow,
/// each contributing the members not already claimed by an individual slot or
/// an earlier group. A user therefore appears at most once, and an explicit
/// individual slot always beats group membership.
pub fn resolve_recipients(
    event_id: Uuid,
    assignments: &[AssignmentRow],
    group_members: &HashMap<Uuid, Vec<Uuid>>,
) -> Vec<ResolvedRecipient> {
    let mut claimed: HashSet<Uuid> = HashSet::new();
    let mut recipients = Vec::new();

    for row in assignments {
        if let Some(AssignmentTarget::Individual(user_id)) = row.target() {
            if claimed.insert(user_id) {
                recipients.push(ResolvedRecipient {
                    event_id,
                    user_id,
                    source: RecipientSource::Individual { assignment_id: row.id },
                    role_name: row.role_name.clone(),
                });
            }
        }
    }

    for row in assignments {
        let Some(AssignmentTarget::Group(group_id)) = row.target() else {
            continue;
        };
        let Some(members) = group_members.get(&group_id) else {
            continue;
        };
        for &user_id in members {
            if claimed.insert(user_id) {
                recipients.push(ResolvedRecipient {
                    event_id,
                    user_id,
                    source: RecipientSource::Group {
                        assignment_id: row.id,
                        group_id,
                    },
                    role_name: row.role_name.clone(),
                });
            }
        }
    }

    recipients
}

#[derive(Clone)]
pub struct RecipientResolver {
    events: Arc<dyn EventStore>,
}

impl RecipientResolver {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    /// Reads the event's assignments and the live membership of every assigned
    /// group, then resolves the deduplicated recipient set.
    pub async fn resolve(&self, event: &Event) -> Result<Vec<ResolvedRecipient>> {
        let assignments = self.events.find_assignments(event.id).await?;

        let mut group_members = HashMap::new();
        for row in &assignments {
            match row.target() {
                Some(AssignmentTarget::Group(group_id)) if !group_members.contains_key(&group_id) => {
                    let members = self.events.find_group_members(group_id).await?;
                    group_members.insert(group_id, members);
                }
                Some(_) => {}
                None => debug!(
                    event_id = %event.id,
                    assignment_id = %row.id,
                    "Ignoring assignment with neither user nor group"
                ),
            }
        }

        let recipients = resolve_recipients(event.id, &assignments, &group_members);
        debug!(
            event_id = %event.id,
            assignments = assignments.len(),
            recipients = recipients.len(),
            "Resolved event recipients"
        );

        Ok(recipients)
    }
}
