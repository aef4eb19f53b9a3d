use crate::delivery::{DeliveryLog, EmailSender, ImmediateSender};
use crate::digest::{DigestJob, DigestQueue, DigestQueuer};
use crate::error::{AppError, Result};
use crate::event::{Event, EventStore};
use crate::recipient::{RecipientResolver, ResolvedRecipient};
use crate::reminder::{PolicyStore, ReminderAction, ReminderEngine, ReminderPolicy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::notification_dto::{DigestSummary, ScheduleSummary};

/// Store and collaborator handles the service is built from.
#[derive(Clone)]
pub struct NotificationDeps {
    pub events: Arc<dyn EventStore>,
    pub policies: Arc<dyn PolicyStore>,
    pub deliveries: Arc<dyn DeliveryLog>,
    pub digests: Arc<dyn DigestQueue>,
    pub email: Arc<dyn EmailSender>,
}

/// Entry point for the event-mutation flow.
///
/// Both operations are best-effort side effects: they never return an error.
/// Every failure is logged and shows up as a missing action, report or job in
/// the returned summary.
pub struct NotificationService {
    events: Arc<dyn EventStore>,
    policies: Arc<dyn PolicyStore>,
    resolver: RecipientResolver,
    engine: ReminderEngine,
    sender: ImmediateSender,
    digests: DigestQueuer,
}

#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct SweepStats {
    pub events: usize,
    pub reminders_sent: usize,
}

impl NotificationService {
    pub fn new(deps: NotificationDeps, engine: ReminderEngine, digests: DigestQueuer) -> Self {
        Self {
            resolver: RecipientResolver::new(deps.events.clone()),
            sender: ImmediateSender::new(deps.events.clone(), deps.deliveries.clone(), deps.email.clone()),
            events: deps.events,
            policies: deps.policies,
            engine,
            digests,
        }
    }

    pub async fn schedule_event_notifications(
        &self,
        event_id: Uuid,
        church_id: Uuid,
        skip_past_check: bool,
    ) -> ScheduleSummary {
        self.schedule_event_notifications_at(event_id, church_id, skip_past_check, Utc::now())
            .await
    }

    pub async fn schedule_event_notifications_at(
        &self,
        event_id: Uuid,
        church_id: Uuid,
        skip_past_check: bool,
        now: DateTime<Utc>,
    ) -> ScheduleSummary {
        let mut summary = ScheduleSummary::empty(event_id);

        let (event, recipients, policy) = match self.load_for_reminders(event_id, church_id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(%event_id, %church_id, "Skipping reminder scheduling: {}", e);
                return summary;
            }
        };

        summary.actions = self
            .engine
            .decide(&event, &policy, &recipients, now, skip_past_check);

        for action in &summary.actions {
            match action {
                ReminderAction::SendNow { offset_hours } => {
                    match self.sender.send_now(&event, *offset_hours, &recipients, now).await {
                        Ok(report) => summary.deliveries.push(report),
                        Err(e) => error!(
                            %event_id,
                            offset_hours,
                            "Reminder delivery aborted: {}",
                            e
                        ),
                    }
                }
                ReminderAction::Defer { offset_hours, notify_at } => {
                    debug!(%event_id, offset_hours, %notify_at, "Reminder deferred to sweep");
                }
                ReminderAction::Skip { offset_hours, reason } => {
                    debug!(%event_id, offset_hours, %reason, "Reminder skipped");
                }
            }
        }

        summary
    }

    async fn load_for_reminders(
        &self,
        event_id: Uuid,
        church_id: Uuid,
    ) -> Result<(Event, Vec<ResolvedRecipient>, ReminderPolicy)> {
        let event = self.load_event(event_id, church_id).await?;
        let policy = self.policies.find_policy(church_id).await?;
        if policy.is_empty() {
            return Ok((event, Vec::new(), policy));
        }
        let recipients = self.resolver.resolve(&event).await?;
        Ok((event, recipients, policy))
    }

    pub async fn queue_event_update_digest(&self, event_id: Uuid, church_id: Uuid) -> DigestSummary {
        self.queue_event_update_digest_at(event_id, church_id, Utc::now()).await
    }

    pub async fn queue_event_update_digest_at(
        &self,
        event_id: Uuid,
        church_id: Uuid,
        now: DateTime<Utc>,
    ) -> DigestSummary {
        match self.queue_digest_jobs(event_id, church_id, now).await {
            Ok(queued) => {
                debug!(%event_id, queued = queued.len(), "Queued event update digests");
                DigestSummary { event_id, queued }
            }
            Err(e) => {
                warn!(%event_id, %church_id, "Skipping digest queueing: {}", e);
                DigestSummary {
                    event_id,
                    queued: Vec::new(),
                }
            }
        }
    }

    async fn queue_digest_jobs(
        &self,
        event_id: Uuid,
        church_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<DigestJob>> {
        let event = self.load_event(event_id, church_id).await?;
        let recipients = self.resolver.resolve(&event).await?;
        self.digests.queue_digest(&event, &recipients, now).await
    }

    async fn load_event(&self, event_id: Uuid, church_id: Uuid) -> Result<Event> {
        self.events
            .find_event(church_id, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event {} in church {}", event_id, church_id)))
    }

    /// Re-evaluates every event that starts soon enough for one of its reminders
    /// to come due. The window is `lookahead`, widened to the largest enabled
    /// offset plus the send window so long offsets are seen at their notify time.
    /// This is the periodic trigger that eventually fires deferred reminders.
    pub async fn sweep_upcoming(&self, now: DateTime<Utc>, lookahead: chrono::Duration) -> Result<SweepStats> {
        let horizon = self.sweep_horizon(lookahead).await?;
        let until = now.checked_add_signed(horizon).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let events = self.events.find_events_starting_between(now, until).await?;

        let mut stats = SweepStats {
            events: events.len(),
            ..Default::default()
        };

        for event in events {
            let summary = self
                .schedule_event_notifications_at(event.id, event.church_id, false, now)
                .await;
            stats.reminders_sent += summary.deliveries.iter().map(|d| d.sent).sum::<usize>();
        }

        info!(events = stats.events, reminders_sent = stats.reminders_sent, "Notification sweep finished");
        Ok(stats)
    }

    async fn sweep_horizon(&self, lookahead: chrono::Duration) -> Result<chrono::Duration> {
        let Some(max_offset) = self.policies.find_max_offset().await? else {
            return Ok(lookahead);
        };
        let needed = chrono::Duration::hours(i64::from(max_offset)) + self.engine.send_window();
        Ok(lookahead.max(needed))
    }
}
