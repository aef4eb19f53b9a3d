use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::event_models::{AssignmentRow, Event, RecipientProfile};

/// Read access to events, their assignments, group membership and user preferences.
/// All of it is owned by the surrounding application.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_event(&self, church_id: Uuid, event_id: Uuid) -> Result<Option<Event>>;

    async fn find_assignments(&self, event_id: Uuid) -> Result<Vec<AssignmentRow>>;

    /// Live membership of a group at read time.
    async fn find_group_members(&self, group_id: Uuid) -> Result<Vec<Uuid>>;

    async fn find_recipient_profile(&self, user_id: Uuid) -> Result<Option<RecipientProfile>>;

    async fn find_events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>>;
}

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn find_event(&self, church_id: Uuid, event_id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, church_id, name, start_time, end_time, location
             FROM events WHERE id = $1 AND church_id = $2"
        )
        .bind(event_id)
        .bind(church_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn find_assignments(&self, event_id: Uuid) -> Result<Vec<AssignmentRow>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            "SELECT id, event_id, user_id, group_id, role_name
             FROM event_assignments WHERE event_id = $1
             ORDER BY created_at, id"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_group_members(&self, group_id: Uuid) -> Result<Vec<Uuid>> {
        let members = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM group_members WHERE group_id = $1 ORDER BY joined_at, user_id"
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn find_recipient_profile(&self, user_id: Uuid) -> Result<Option<RecipientProfile>> {
        let profile = sqlx::query_as::<_, RecipientProfile>(
            "SELECT u.id AS user_id,
                    u.name,
                    u.email,
                    COALESCE(p.email_enabled, TRUE) AS email_enabled,
                    COALESCE(p.digest_enabled, TRUE) AS digest_enabled,
                    p.timezone
             FROM users u
             LEFT JOIN user_notification_preferences p ON p.user_id = u.id
             WHERE u.id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn find_events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT id, church_id, name, start_time, end_time, location
             FROM events WHERE start_time >= $1 AND start_time <= $2
             ORDER BY start_time"
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}

/// In-memory implementation of EventStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<HashMap<Uuid, Event>>>,
    assignments: Arc<RwLock<Vec<AssignmentRow>>>,
    groups: Arc<RwLock<HashMap<Uuid, Vec<Uuid>>>>,
    profiles: Arc<RwLock<HashMap<Uuid, RecipientProfile>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_event(&self, event: Event) {
        self.events.write().await.insert(event.id, event);
    }

    pub async fn assign_user(&self, event_id: Uuid, user_id: Uuid, role_name: &str) -> Uuid {
        self.push_assignment(event_id, Some(user_id), None, role_name).await
    }

    pub async fn assign_group(&self, event_id: Uuid, group_id: Uuid, role_name: &str) -> Uuid {
        self.push_assignment(event_id, None, Some(group_id), role_name).await
    }

    async fn push_assignment(
        &self,
        event_id: Uuid,
        user_id: Option<Uuid>,
        group_id: Option<Uuid>,
        role_name: &str,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.assignments.write().await.push(AssignmentRow {
            id,
            event_id,
            user_id,
            group_id,
            role_name: role_name.to_string(),
        });
        id
    }

    pub async fn add_group_member(&self, group_id: Uuid, user_id: Uuid) {
        let mut groups = self.groups.write().await;
        let members = groups.entry(group_id).or_default();
        if !members.contains(&user_id) {
            members.push(user_id);
        }
    }

    pub async fn remove_group_member(&self, group_id: Uuid, user_id: Uuid) {
        if let Some(members) = self.groups.write().await.get_mut(&group_id) {
            members.retain(|member| *member != user_id);
        }
    }

    pub async fn upsert_profile(&self, profile: RecipientProfile) {
        self.profiles.write().await.insert(profile.user_id, profile);
    }

    /// Makes every lookup fail with `DataUnavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::DataUnavailable("event store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn find_event(&self, church_id: Uuid, event_id: Uuid) -> Result<Option<Event>> {
        self.check_available()?;
        let events = self.events.read().await;
        Ok(events
            .get(&event_id)
            .filter(|event| event.church_id == church_id)
            .cloned())
    }

    async fn find_assignments(&self, event_id: Uuid) -> Result<Vec<AssignmentRow>> {
        self.check_available()?;
        let assignments = self.assignments.read().await;
        Ok(assignments
            .iter()
            .filter(|row| row.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn find_group_members(&self, group_id: Uuid) -> Result<Vec<Uuid>> {
        self.check_available()?;
        let groups = self.groups.read().await;
        Ok(groups.get(&group_id).cloned().unwrap_or_default())
    }

    async fn find_recipient_profile(&self, user_id: Uuid) -> Result<Option<RecipientProfile>> {
        self.check_available()?;
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&user_id).cloned())
    }

    async fn find_events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        self.check_available()?;
        let events = self.events.read().await;
        let mut result: Vec<Event> = events
            .values()
            .filter(|event| event.start_time >= from && event.start_time <= to)
            .cloned()
            .collect();
        result.sort_by_key(|event| event.start_time);
        Ok(result)
    }
}
