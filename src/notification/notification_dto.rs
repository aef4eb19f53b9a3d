use crate::delivery::DeliveryReport;
use crate::digest::DigestJob;
use crate::reminder::ReminderAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleNotificationsQuery {
    /// Evaluate the event even if it already started (administrative re-trigger).
    #[serde(default)]
    pub skip_past_check: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleSummary {
    pub event_id: Uuid,
    pub actions: Vec<ReminderAction>,
    pub deliveries: Vec<DeliveryReport>,
}

impl ScheduleSummary {
    pub fn empty(event_id: Uuid) -> Self {
        Self {
            event_id,
            actions: Vec::new(),
            deliveries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DigestSummary {
    pub event_id: Uuid,
    pub queued: Vec<DigestJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub last_sweep_at: Option<DateTime<Utc>>,
    pub sweep_stale: bool,
}
