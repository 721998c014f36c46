//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod callbacks;
pub mod commands;
pub mod handlers;
pub mod keyboards;
pub mod registration;

pub use bot::{create_bot, Bot};
pub use handlers::{schema, HandlerDeps, HandlerError};
