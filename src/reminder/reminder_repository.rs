use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::reminder_models::ReminderPolicy;

#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// The church's enabled reminder offsets. A church without a policy yields an empty one.
    async fn find_policy(&self, church_id: Uuid) -> Result<ReminderPolicy>;

    /// Largest enabled offset across all churches, if any church has one.
    async fn find_max_offset(&self) -> Result<Option<i32>>;
}

#[derive(Clone)]
pub struct ReminderPolicyRepository {
    pool: PgPool,
}

impl ReminderPolicyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PolicyStore for ReminderPolicyRepository {
    async fn find_policy(&self, church_id: Uuid) -> Result<ReminderPolicy> {
        let offsets = sqlx::query_scalar::<_, i32>(
            "SELECT offset_hours FROM church_reminder_offsets
             WHERE church_id = $1 AND enabled = TRUE
             ORDER BY offset_hours DESC"
        )
        .bind(church_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ReminderPolicy::new(church_id, offsets))
    }

    async fn find_max_offset(&self) -> Result<Option<i32>> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(offset_hours) FROM church_reminder_offsets WHERE enabled = TRUE"
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }
}

/// In-memory implementation of PolicyStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryPolicyStore {
    offsets: Arc<RwLock<HashMap<Uuid, Vec<i32>>>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_offsets(&self, church_id: Uuid, offsets: Vec<i32>) {
        self.offsets.write().await.insert(church_id, offsets);
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn find_policy(&self, church_id: Uuid) -> Result<ReminderPolicy> {
        let offsets = self.offsets.read().await;
        Ok(ReminderPolicy::new(
            church_id,
            offsets.get(&church_id).cloned().unwrap_or_default(),
        ))
    }

    async fn find_max_offset(&self) -> Result<Option<i32>> {
        let offsets = self.offsets.read().await;
        Ok(offsets
            .values()
            .flatten()
            .copied()
            .filter(|hours| *hours >= 0)
            .max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_max_offset_spans_churches() {
        let store = InMemoryPolicyStore::new();
        assert_eq!(store.find_max_offset().await.unwrap(), None);

        store.set_offsets(Uuid::new_v4(), vec![24, 2]).await;
        store.set_offsets(Uuid::new_v4(), vec![720, -1]).await;
        assert_eq!(store.find_max_offset().await.unwrap(), Some(720));
    }
}
