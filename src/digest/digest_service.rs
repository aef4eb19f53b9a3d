use crate::delivery::NotificationKind;
use crate::error::Result;
use crate::event::{Event, EventStore, RecipientProfile};
use crate::recipient::ResolvedRecipient;
use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::digest_models::DigestJob;
use super::digest_repository::DigestQueue;

/// The absolute instant of `at` wall-clock time on `date` in `tz`.
///
/// Ambiguous times (clocks falling back) take the earlier instant. Times inside
/// a spring-forward gap move one hour later, matching what the wall clock shows.
pub fn local_send_instant(tz: Tz, date: NaiveDate, at: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(at);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}

#[derive(Clone)]
pub struct DigestQueuer {
    events: Arc<dyn EventStore>,
    queue: Arc<dyn DigestQueue>,
    default_timezone: Tz,
    send_time: NaiveTime,
}

impl DigestQueuer {
    pub fn new(
        events: Arc<dyn EventStore>,
        queue: Arc<dyn DigestQueue>,
        default_timezone: Tz,
        send_time: NaiveTime,
    ) -> Self {
        Self {
            events,
            queue,
            default_timezone,
            send_time,
        }
    }

    fn timezone_for(&self, profile: &RecipientProfile) -> Tz {
        match profile.timezone.as_deref() {
            Some(name) => name.parse().unwrap_or_else(|_| {
                warn!(user_id = %profile.user_id, timezone = name, "Unknown timezone, using default");
                self.default_timezone
            }),
            None => self.default_timezone,
        }
    }

    /// Local calendar day and send instant of today's digest for `profile`.
    pub fn digest_slot(&self, profile: &RecipientProfile, now: DateTime<Utc>) -> (NaiveDate, DateTime<Utc>) {
        let tz = self.timezone_for(profile);
        let today = now.with_timezone(&tz).date_naive();
        (today, local_send_instant(tz, today, self.send_time))
    }

    /// Queues one event-update digest per opted-in recipient. Lookup and insert
    /// failures skip that recipient only.
    pub async fn queue_digest(
        &self,
        event: &Event,
        recipients: &[ResolvedRecipient],
        now: DateTime<Utc>,
    ) -> Result<Vec<DigestJob>> {
        let mut queued = Vec::new();

        for recipient in recipients {
            let profile = match self.events.find_recipient_profile(recipient.user_id).await {
                Ok(Some(profile)) => profile,
                Ok(None) => {
                    debug!(user_id = %recipient.user_id, "No profile for digest recipient");
                    continue;
                }
                Err(e) => {
                    warn!(user_id = %recipient.user_id, "Digest recipient lookup failed: {:?}", e);
                    continue;
                }
            };

            if !profile.digest_enabled {
                continue;
            }

            let (digest_date, scheduled_for) = self.digest_slot(&profile, now);
            let job = DigestJob {
                id: Uuid::new_v4(),
                user_id: recipient.user_id,
                event_id: event.id,
                church_id: event.church_id,
                kind: NotificationKind::EventUpdateDigest,
                digest_date,
                scheduled_for,
                created_at: now,
                sent_at: None,
            };

            match self.queue.enqueue(&job).await {
                Ok(true) => queued.push(job),
                Ok(false) => debug!(
                    user_id = %recipient.user_id,
                    event_id = %event.id,
                    %digest_date,
                    "Digest already pending for today"
                ),
                Err(e) => warn!(user_id = %recipient.user_id, event_id = %event.id, "Failed to queue digest: {:?}", e),
            }
        }

        Ok(queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::InMemoryDigestQueue;
    use crate::event::InMemoryEventStore;
    use crate::recipient::RecipientSource;
    use crate::test_support::{event_starting_at, profile};

    fn eight_pm() -> NaiveTime {
        NaiveTime::from_hms_opt(20, 0, 0).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn queuer(events: &InMemoryEventStore, queue: &InMemoryDigestQueue) -> DigestQueuer {
        DigestQueuer::new(
            Arc::new(events.clone()),
            Arc::new(queue.clone()),
            chrono_tz::UTC,
            eight_pm(),
        )
    }

    async fn recipient_with(events: &InMemoryEventStore, event: &Event, profile: RecipientProfile) -> ResolvedRecipient {
        events.upsert_profile(profile.clone()).await;
        ResolvedRecipient {
            event_id: event.id,
            user_id: profile.user_id,
            source: RecipientSource::Individual {
                assignment_id: Uuid::new_v4(),
            },
            role_name: "Nursery".to_string(),
        }
    }

    #[test]
    fn test_local_send_instant() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        assert_eq!(
            local_send_instant(chrono_tz::America::Chicago, date, eight_pm()),
            at("2026-07-02T01:00:00Z")
        );
        assert_eq!(
            local_send_instant(chrono_tz::UTC, date, eight_pm()),
            at("2026-07-01T20:00:00Z")
        );
    }

    #[test]
    fn test_local_send_instant_in_dst_gap() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let two_am = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        assert_eq!(
            local_send_instant(chrono_tz::America::New_York, date, two_am),
            at("2026-03-08T07:00:00Z")
        );
    }

    #[test]
    fn test_local_send_instant_in_fall_back_overlap() {
        let date = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let half_past_one = NaiveTime::from_hms_opt(1, 30, 0).unwrap();
        // 01:30 happens twice; EDT (UTC-4) comes first.
        assert_eq!(
            local_send_instant(chrono_tz::America::New_York, date, half_past_one),
            at("2026-11-01T05:30:00Z")
        );
    }

    #[tokio::test]
    async fn test_digest_slot_uses_recipient_local_day() {
        let events = InMemoryEventStore::new();
        let queue = InMemoryDigestQueue::new();
        let queuer = queuer(&events, &queue);

        let mut tokyo = profile("kenji@example.org");
        tokyo.timezone = Some("Asia/Tokyo".to_string());
        let (day, instant) = queuer.digest_slot(&tokyo, at("2026-07-01T16:00:00Z"));
        assert_eq!(day, NaiveDate::from_ymd_opt(2026, 7, 2).unwrap());
        assert_eq!(instant, at("2026-07-02T11:00:00Z"));

        let mut broken = profile("lost@example.org");
        broken.timezone = Some("Nowhere/Special".to_string());
        let (_, fallback) = queuer.digest_slot(&broken, at("2026-07-01T16:00:00Z"));
        assert_eq!(fallback, at("2026-07-01T20:00:00Z"));
    }

    #[tokio::test]
    async fn test_queue_digest_twice_same_day_creates_one_job() {
        let events = InMemoryEventStore::new();
        let queue = InMemoryDigestQueue::new();
        let queuer = queuer(&events, &queue);
        let now = at("2026-07-01T09:00:00Z");
        let event = event_starting_at(now + Duration::days(3));
        let recipients = vec![recipient_with(&events, &event, profile("ana@example.org")).await];

        let first = queuer.queue_digest(&event, &recipients, now).await.unwrap();
        let second = queuer
            .queue_digest(&event, &recipients, now + Duration::hours(2))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        let jobs = queue.jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, NotificationKind::EventUpdateDigest);
        assert_eq!(jobs[0].scheduled_for, at("2026-07-01T20:00:00Z"));
    }

    #[tokio::test]
    async fn test_queue_digest_after_sent_or_next_day() {
        let events = InMemoryEventStore::new();
        let queue = InMemoryDigestQueue::new();
        let queuer = queuer(&events, &queue);
        let now = at("2026-07-01T09:00:00Z");
        let event = event_starting_at(now + Duration::days(3));
        let recipients = vec![recipient_with(&events, &event, profile("ana@example.org")).await];

        let first = queuer.queue_digest(&event, &recipients, now).await.unwrap();
        queue.mark_sent(first[0].id, at("2026-07-01T20:00:05Z")).await;

        let after_send = queuer
            .queue_digest(&event, &recipients, at("2026-07-01T21:00:00Z"))
            .await
            .unwrap();
        assert_eq!(after_send.len(), 1);

        let next_day = queuer
            .queue_digest(&event, &recipients, at("2026-07-02T09:00:00Z"))
            .await
            .unwrap();
        assert_eq!(next_day.len(), 1);
        assert_eq!(queue.jobs().await.len(), 3);
    }

    #[tokio::test]
    async fn test_opted_out_and_unknown_recipients_are_skipped() {
        let events = InMemoryEventStore::new();
        let queue = InMemoryDigestQueue::new();
        let queuer = queuer(&events, &queue);
        let now = at("2026-07-01T09:00:00Z");
        let event = event_starting_at(now + Duration::days(1));

        let mut opted_out = profile("quiet@example.org");
        opted_out.digest_enabled = false;
        let mut recipients = vec![recipient_with(&events, &event, opted_out).await];
        recipients.push(ResolvedRecipient {
            event_id: event.id,
            user_id: Uuid::new_v4(),
            source: RecipientSource::Individual {
                assignment_id: Uuid::new_v4(),
            },
            role_name: "Nursery".to_string(),
        });

        let queued = queuer.queue_digest(&event, &recipients, now).await.unwrap();
        assert!(queued.is_empty());
        assert!(queue.jobs().await.is_empty());
    }
}
