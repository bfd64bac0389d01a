//! Zendesk API collaborators
//!
//! Everything that talks HTTP lives here: wire models for the ticket-field
//! and custom-object endpoints, the per-account client, and the retry
//! policy for transient failures. The migration engine in `crate::migrate`
//! consumes this layer only through its reader/writer traits.

pub mod client;
pub mod error;
pub mod models;
pub mod retry;

pub use client::ZendeskClient;
pub use error::{CreationError, TransportError};
pub use models::{
    ChildFieldResource, ConditionResource, CustomObjectResource, FieldType, TicketFieldResource,
};
pub use retry::RetryConfig;
