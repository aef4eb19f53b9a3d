use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use super::notification_dto::{DigestSummary, HealthResponse, ScheduleNotificationsQuery, ScheduleSummary};

/// Evaluate reminder offsets for an event and send the ones that are due
#[utoipa::path(
    post,
    path = "/api/churches/{church_id}/events/{event_id}/notifications",
    params(
        ("church_id" = Uuid, Path, description = "Church ID"),
        ("event_id" = Uuid, Path, description = "Event ID"),
        ScheduleNotificationsQuery
    ),
    responses(
        (status = 200, description = "Decisions taken and deliveries attempted", body = ScheduleSummary)
    ),
    tag = "notifications"
)]
pub async fn schedule_event_notifications(
    State(state): State<AppState>,
    Path((church_id, event_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ScheduleNotificationsQuery>,
) -> Json<ScheduleSummary> {
    let summary = state
        .notification_service
        .schedule_event_notifications(event_id, church_id, query.skip_past_check)
        .await;

    Json(summary)
}

/// Queue today's end-of-day digest for every opted-in recipient of an event
#[utoipa::path(
    post,
    path = "/api/churches/{church_id}/events/{event_id}/digest",
    params(
        ("church_id" = Uuid, Path, description = "Church ID"),
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Digest jobs queued by this call", body = DigestSummary)
    ),
    tag = "notifications"
)]
pub async fn queue_event_update_digest(
    State(state): State<AppState>,
    Path((church_id, event_id)): Path<(Uuid, Uuid)>,
) -> Json<DigestSummary> {
    let summary = state
        .notification_service
        .queue_event_update_digest(event_id, church_id)
        .await;

    Json(summary)
}

/// Report whether the periodic sweep is still running
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service and sweep liveness", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let sweep_stale = state
        .heartbeat
        .is_stale(Utc::now(), state.config.sweep_stale_after());

    Json(HealthResponse {
        status: if sweep_stale { "degraded" } else { "ok" }.to_string(),
        last_sweep_at: state.heartbeat.last_beat(),
        sweep_stale,
    })
}
