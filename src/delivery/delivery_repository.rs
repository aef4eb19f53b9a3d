use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::delivery_models::{Activity, ClaimKey, NotificationDeliveryRecord};

/// Durable log of claims, deliveries and audit activity.
#[async_trait]
pub trait DeliveryLog: Send + Sync {
    /// Atomically claims the right to send. Returns `false` when another caller
    /// already holds the claim.
    async fn try_claim(&self, key: ClaimKey, claimed_at: DateTime<Utc>) -> Result<bool>;

    async fn release_claim(&self, key: ClaimKey) -> Result<()>;

    /// Insert-or-ignore. Returns `false` when the record already existed.
    async fn record_delivery(&self, record: &NotificationDeliveryRecord) -> Result<bool>;

    async fn record_activity(&self, activity: &Activity) -> Result<()>;
}

#[derive(Clone)]
pub struct DeliveryRepository {
    pool: PgPool,
}

impl DeliveryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryLog for DeliveryRepository {
    async fn try_claim(&self, key: ClaimKey, claimed_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO notification_claims (event_id, kind, offset_hours, claimed_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (event_id, kind, offset_hours) DO NOTHING"
        )
        .bind(key.event_id)
        .bind(key.kind.as_str())
        .bind(key.offset_hours)
        .bind(claimed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_claim(&self, key: ClaimKey) -> Result<()> {
        sqlx::query(
            "DELETE FROM notification_claims
             WHERE event_id = $1 AND kind = $2 AND offset_hours = $3"
        )
        .bind(key.event_id)
        .bind(key.kind.as_str())
        .bind(key.offset_hours)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_delivery(&self, record: &NotificationDeliveryRecord) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO notification_deliveries (id, event_id, kind, offset_hours, recipient_id, sent_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (event_id, kind, offset_hours, recipient_id) DO NOTHING"
        )
        .bind(record.id)
        .bind(record.event_id)
        .bind(record.kind.as_str())
        .bind(record.offset_hours)
        .bind(record.recipient_id)
        .bind(record.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_activity(&self, activity: &Activity) -> Result<()> {
        sqlx::query(
            "INSERT INTO activities (id, church_id, event_id, user_id, action, details, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        )
        .bind(activity.id)
        .bind(activity.church_id)
        .bind(activity.event_id)
        .bind(activity.user_id)
        .bind(&activity.action)
        .bind(&activity.details)
        .bind(activity.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-memory implementation of DeliveryLog (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryDeliveryLog {
    claims: Arc<Mutex<HashSet<ClaimKey>>>,
    records: Arc<Mutex<Vec<NotificationDeliveryRecord>>>,
    activities: Arc<Mutex<Vec<Activity>>>,
}

impl InMemoryDeliveryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<NotificationDeliveryRecord> {
        self.records.lock().await.clone()
    }

    pub async fn activities(&self) -> Vec<Activity> {
        self.activities.lock().await.clone()
    }

    pub async fn is_claimed(&self, key: ClaimKey) -> bool {
        self.claims.lock().await.contains(&key)
    }
}

#[async_trait]
impl DeliveryLog for InMemoryDeliveryLog {
    async fn try_claim(&self, key: ClaimKey, _claimed_at: DateTime<Utc>) -> Result<bool> {
        Ok(self.claims.lock().await.insert(key))
    }

    async fn release_claim(&self, key: ClaimKey) -> Result<()> {
        self.claims.lock().await.remove(&key);
        Ok(())
    }

    async fn record_delivery(&self, record: &NotificationDeliveryRecord) -> Result<bool> {
        let mut records = self.records.lock().await;
        let exists = records.iter().any(|r| {
            r.event_id == record.event_id
                && r.kind == record.kind
                && r.offset_hours == record.offset_hours
                && r.recipient_id == record.recipient_id
        });
        if exists {
            return Ok(false);
        }
        records.push(record.clone());
        Ok(true)
    }

    async fn record_activity(&self, activity: &Activity) -> Result<()> {
        self.activities.lock().await.push(activity.clone());
        Ok(())
    }
}
