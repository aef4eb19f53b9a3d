use crate::error::Result;
use crate::event::{Event, EventStore};
use crate::recipient::ResolvedRecipient;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::delivery_models::{Activity, ClaimKey, DeliveryReport, NotificationDeliveryRecord};
use super::delivery_repository::DeliveryLog;
use super::email_sender::{EmailSender, ReminderEmail};

/// Claims an (event, offset) reminder once and fans it out to every recipient.
#[derive(Clone)]
pub struct ImmediateSender {
    events: Arc<dyn EventStore>,
    log: Arc<dyn DeliveryLog>,
    email: Arc<dyn EmailSender>,
}

enum Outcome {
    Sent,
    Failed,
    Skipped,
}

impl ImmediateSender {
    pub fn new(events: Arc<dyn EventStore>, log: Arc<dyn DeliveryLog>, email: Arc<dyn EmailSender>) -> Self {
        Self { events, log, email }
    }

    pub async fn send_now(
        &self,
        event: &Event,
        offset_hours: i32,
        recipients: &[ResolvedRecipient],
        now: DateTime<Utc>,
    ) -> Result<DeliveryReport> {
        let key = ClaimKey::reminder(event.id, offset_hours);
        if !self.log.try_claim(key, now).await? {
            debug!(event_id = %event.id, offset_hours, "Reminder already claimed, skipping");
            return Ok(DeliveryReport::already_sent(offset_hours));
        }

        let mut report = DeliveryReport {
            offset_hours,
            ..Default::default()
        };

        for recipient in recipients {
            match self.deliver(event, offset_hours, recipient, now).await {
                Outcome::Sent => report.sent += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Skipped => report.skipped += 1,
            }
        }

        // Nobody got it: give the claim back so a later trigger can try again.
        if report.sent == 0 && report.failed > 0 {
            if let Err(e) = self.log.release_claim(key).await {
                error!(event_id = %event.id, offset_hours, "Failed to release reminder claim: {:?}", e);
            }
        }

        info!(
            event_id = %event.id,
            offset_hours,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            sender = self.email.name(),
            "Sent reminder for event: {}",
            event.name
        );

        Ok(report)
    }

    async fn deliver(
        &self,
        event: &Event,
        offset_hours: i32,
        recipient: &ResolvedRecipient,
        now: DateTime<Utc>,
    ) -> Outcome {
        let profile = match self.events.find_recipient_profile(recipient.user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(user_id = %recipient.user_id, "No profile for recipient, skipping");
                return Outcome::Skipped;
            }
            Err(e) => {
                warn!(user_id = %recipient.user_id, "Recipient lookup failed: {:?}", e);
                return Outcome::Failed;
            }
        };

        if !profile.email_enabled {
            debug!(user_id = %recipient.user_id, "Email disabled for recipient");
            return Outcome::Skipped;
        }

        let email = ReminderEmail {
            to_email: profile.email,
            to_name: profile.name,
            event_id: event.id,
            event_name: event.name.clone(),
            start_time: event.start_time,
            location: event.location.clone(),
            offset_hours,
            role_name: recipient.role_name.clone(),
        };

        if let Err(e) = self.email.send(&email).await {
            warn!(
                event_id = %event.id,
                user_id = %recipient.user_id,
                offset_hours,
                "Reminder send failed: {}",
                e
            );
            return Outcome::Failed;
        }

        let record = NotificationDeliveryRecord::reminder(event.id, offset_hours, recipient.user_id, now);
        match self.log.record_delivery(&record).await {
            Ok(true) => {}
            Ok(false) => warn!(
                event_id = %event.id,
                user_id = %recipient.user_id,
                offset_hours,
                "Delivery record already existed"
            ),
            // The email is out; losing the record only weakens the audit trail.
            Err(e) => error!(event_id = %event.id, user_id = %recipient.user_id, "Failed to record delivery: {:?}", e),
        }

        let activity = Activity {
            id: Uuid::new_v4(),
            church_id: event.church_id,
            event_id: event.id,
            user_id: recipient.user_id,
            action: "reminder_sent".to_string(),
            details: format!("{}h reminder for '{}'", offset_hours, event.name),
            created_at: now,
        };
        if let Err(e) = self.log.record_activity(&activity).await {
            error!(event_id = %event.id, "Failed to record activity: {:?}", e);
        }

        Outcome::Sent
    }
}
