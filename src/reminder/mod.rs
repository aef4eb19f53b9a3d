pub mod reminder_engine;
pub mod reminder_models;
pub mod reminder_repository;

pub use reminder_engine::ReminderEngine;
pub use reminder_models::{ReminderAction, ReminderPolicy, SkipReason};
pub use reminder_repository::{InMemoryPolicyStore, PolicyStore, ReminderPolicyRepository};
