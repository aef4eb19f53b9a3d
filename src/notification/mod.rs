pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_service;
pub mod notification_sweep;

pub use notification_dto::{DigestSummary, HealthResponse, ScheduleNotificationsQuery, ScheduleSummary};
pub use notification_handlers::{health, queue_event_update_digest, schedule_event_notifications};
pub use notification_service::{NotificationDeps, NotificationService, SweepStats};
pub use notification_sweep::{run_sweep, start_notification_sweep, SweepHeartbeat};
