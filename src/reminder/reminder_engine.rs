use crate::event::Event;
use crate::recipient::ResolvedRecipient;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::reminder_models::{ReminderAction, ReminderPolicy, SkipReason};

pub const DEFAULT_SEND_WINDOW_MINUTES: i64 = 30;

/// Decides, per reminder offset, whether to send now, defer to a later sweep, or skip.
#[derive(Debug, Clone, Copy)]
pub struct ReminderEngine {
    send_window: Duration,
}

impl Default for ReminderEngine {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_SEND_WINDOW_MINUTES))
    }
}

impl ReminderEngine {
    pub fn new(send_window: Duration) -> Self {
        Self { send_window }
    }

    pub fn send_window(&self) -> Duration {
        self.send_window
    }

    /// Pure over its inputs. Returns no actions when there is nothing to remind
    /// about, nobody to remind, or the event already started (unless
    /// `skip_past_check` forces evaluation).
    pub fn decide(
        &self,
        event: &Event,
        policy: &ReminderPolicy,
        recipients: &[ResolvedRecipient],
        now: DateTime<Utc>,
        skip_past_check: bool,
    ) -> Vec<ReminderAction> {
        if policy.is_empty() || recipients.is_empty() {
            return Vec::new();
        }

        if !skip_past_check && event.start_time < now {
            debug!(event_id = %event.id, "Event already started, no reminders");
            return Vec::new();
        }

        let time_until_event = event.start_time - now;
        let send_before = now + self.send_window;

        policy
            .offsets()
            .iter()
            .map(|&offset_hours| {
                let lead_time = Duration::hours(i64::from(offset_hours));
                if lead_time > time_until_event {
                    return ReminderAction::Skip {
                        offset_hours,
                        reason: SkipReason::OffsetExceedsLeadTime,
                    };
                }

                let notify_at = event.start_time - lead_time;
                if notify_at <= send_before {
                    ReminderAction::SendNow { offset_hours }
                } else {
                    ReminderAction::Defer {
                        offset_hours,
                        notify_at,
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipient::RecipientSource;
    use crate::test_support::event_starting_at;
    use uuid::Uuid;

    fn recipients_for(event: &Event) -> Vec<ResolvedRecipient> {
        vec![ResolvedRecipient {
            event_id: event.id,
            user_id: Uuid::new_v4(),
            source: RecipientSource::Individual {
                assignment_id: Uuid::new_v4(),
            },
            role_name: "Usher".to_string(),
        }]
    }

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_offsets_longer_than_lead_time_are_skipped() {
        let now = now();
        let event = event_starting_at(now + Duration::hours(10));
        let policy = ReminderPolicy::new(event.church_id, vec![168, 24, 2]);

        let actions = ReminderEngine::default().decide(&event, &policy, &recipients_for(&event), now, false);

        assert_eq!(actions.len(), 3);
        assert_eq!(
            actions[0],
            ReminderAction::Skip {
                offset_hours: 168,
                reason: SkipReason::OffsetExceedsLeadTime
            }
        );
        assert_eq!(
            actions[1],
            ReminderAction::Skip {
                offset_hours: 24,
                reason: SkipReason::OffsetExceedsLeadTime
            }
        );
        // notify_at is eight hours out, well past the window
        assert_eq!(
            actions[2],
            ReminderAction::Defer {
                offset_hours: 2,
                notify_at: now + Duration::hours(8)
            }
        );
    }

    #[test]
    fn test_send_window_boundary() {
        let start: DateTime<Utc> = "2026-03-01T18:00:00Z".parse().unwrap();
        let event = event_starting_at(start);
        let policy = ReminderPolicy::new(event.church_id, vec![2]);
        let recipients = recipients_for(&event);
        let engine = ReminderEngine::default();
        let notify_at = start - Duration::hours(2);

        let inside = engine.decide(&event, &policy, &recipients, notify_at - Duration::minutes(10), false);
        assert_eq!(inside, vec![ReminderAction::SendNow { offset_hours: 2 }]);

        let edge = engine.decide(&event, &policy, &recipients, notify_at - Duration::minutes(30), false);
        assert_eq!(edge, vec![ReminderAction::SendNow { offset_hours: 2 }]);

        let outside = engine.decide(&event, &policy, &recipients, notify_at - Duration::minutes(45), false);
        assert_eq!(
            outside,
            vec![ReminderAction::Defer {
                offset_hours: 2,
                notify_at
            }]
        );
    }

    #[test]
    fn test_overdue_offset_still_sends() {
        let now = now();
        let event = event_starting_at(now + Duration::minutes(90));
        let policy = ReminderPolicy::new(event.church_id, vec![1]);

        let actions = ReminderEngine::default().decide(&event, &policy, &recipients_for(&event), now, false);
        assert_eq!(actions, vec![ReminderAction::SendNow { offset_hours: 1 }]);
    }

    #[test]
    fn test_past_event_is_suppressed() {
        let now = now();
        let event = event_starting_at(now - Duration::hours(1));
        let policy = ReminderPolicy::new(event.church_id, vec![168, 24, 2, 0]);

        let actions = ReminderEngine::default().decide(&event, &policy, &recipients_for(&event), now, false);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_skip_past_check_evaluates_started_event() {
        let now = now();
        let event = event_starting_at(now - Duration::hours(1));
        let policy = ReminderPolicy::new(event.church_id, vec![2]);

        let actions = ReminderEngine::default().decide(&event, &policy, &recipients_for(&event), now, true);
        assert_eq!(
            actions,
            vec![ReminderAction::Skip {
                offset_hours: 2,
                reason: SkipReason::OffsetExceedsLeadTime
            }]
        );
    }

    #[test]
    fn test_empty_policy_or_recipients_produce_nothing() {
        let now = now();
        let event = event_starting_at(now + Duration::hours(3));
        let engine = ReminderEngine::default();

        let empty_policy = ReminderPolicy::new(event.church_id, Vec::new());
        assert!(engine
            .decide(&event, &empty_policy, &recipients_for(&event), now, false)
            .is_empty());

        let policy = ReminderPolicy::new(event.church_id, vec![2]);
        assert!(engine.decide(&event, &policy, &[], now, false).is_empty());
    }

    #[test]
    fn test_custom_send_window() {
        let now = now();
        let event = event_starting_at(now + Duration::hours(3));
        let policy = ReminderPolicy::new(event.church_id, vec![2]);
        let recipients = recipients_for(&event);

        let narrow = ReminderEngine::new(Duration::minutes(5));
        assert!(matches!(
            narrow.decide(&event, &policy, &recipients, now, false)[0],
            ReminderAction::Defer { .. }
        ));

        let wide = ReminderEngine::new(Duration::minutes(90));
        assert_eq!(
            wide.decide(&event, &policy, &recipients, now, false),
            vec![ReminderAction::SendNow { offset_hours: 2 }]
        );
    }
}
