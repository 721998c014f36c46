//! Telegram bot handler tree configuration
//!
//! One dispatcher schema: slash commands first, then registration answers,
//! then inline-button callbacks.

mod schema;
mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError, Sender};
