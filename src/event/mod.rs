pub mod event_models;
pub mod event_repository;

pub use event_models::{AssignmentRow, AssignmentTarget, Event, RecipientProfile};
pub use event_repository::{EventRepository, EventStore, InMemoryEventStore};
