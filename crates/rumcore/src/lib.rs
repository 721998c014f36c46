//! rumcore: crew roster domain for the rumbot Telegram bot
//!
//! Character profiles with two currencies, the registration dialogue,
//! administrator events and the command language. Nothing here talks to
//! Telegram; the `telegram` feature only adds the conversion from
//! `teloxide::RequestError` into [`AppError`].

pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod logging;
pub mod registration;
pub mod render;
pub mod storage;
pub mod types;

pub use error::{AppError, AppResult};
