pub mod delivery_models;
pub mod delivery_repository;
pub mod delivery_service;
pub mod email_sender;

pub use delivery_models::{Activity, ClaimKey, DeliveryReport, NotificationDeliveryRecord, NotificationKind};
pub use delivery_repository::{DeliveryLog, DeliveryRepository, InMemoryDeliveryLog};
pub use delivery_service::ImmediateSender;
pub use email_sender::{EmailSender, LogEmailSender, ReminderEmail, WebhookEmailSender};
