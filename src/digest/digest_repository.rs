use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::digest_models::DigestJob;

#[async_trait]
pub trait DigestQueue: Send + Sync {
    /// Inserts the job unless a pending job already holds the same
    /// (user, event, kind, day) slot. Returns whether it was inserted.
    async fn enqueue(&self, job: &DigestJob) -> Result<bool>;
}

#[derive(Clone)]
pub struct DigestRepository {
    pool: PgPool,
}

impl DigestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DigestQueue for DigestRepository {
    async fn enqueue(&self, job: &DigestJob) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO digest_jobs
                (id, user_id, event_id, church_id, kind, digest_date, scheduled_for, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (user_id, event_id, kind, digest_date) WHERE sent_at IS NULL DO NOTHING"
        )
        .bind(job.id)
        .bind(job.user_id)
        .bind(job.event_id)
        .bind(job.church_id)
        .bind(job.kind.as_str())
        .bind(job.digest_date)
        .bind(job.scheduled_for)
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// In-memory implementation of DigestQueue (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryDigestQueue {
    jobs: Arc<Mutex<Vec<DigestJob>>>,
}

impl InMemoryDigestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn jobs(&self) -> Vec<DigestJob> {
        self.jobs.lock().await.clone()
    }

    /// What the digest worker does once a digest went out.
    pub async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) {
        if let Some(job) = self.jobs.lock().await.iter_mut().find(|job| job.id == id) {
            job.sent_at = Some(sent_at);
        }
    }
}

#[async_trait]
impl DigestQueue for InMemoryDigestQueue {
    async fn enqueue(&self, job: &DigestJob) -> Result<bool> {
        let mut jobs = self.jobs.lock().await;
        if jobs.iter().any(|existing| existing.is_pending() && existing.same_slot(job)) {
            return Ok(false);
        }
        jobs.push(job.clone());
        Ok(true)
    }
}
