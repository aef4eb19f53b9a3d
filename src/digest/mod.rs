pub mod digest_models;
pub mod digest_repository;
pub mod digest_service;

pub use digest_models::DigestJob;
pub use digest_repository::{DigestQueue, DigestRepository, InMemoryDigestQueue};
pub use digest_service::{local_send_instant, DigestQueuer};
