pub mod recipient_models;
pub mod recipient_resolver;

pub use recipient_models::{RecipientSource, ResolvedRecipient};
pub use recipient_resolver::{resolve_recipients, RecipientResolver};
