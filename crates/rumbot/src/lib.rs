//! rumbot: Telegram front end for the crew roster
//!
//! Wires the [`rumcore`] domain into a teloxide dispatcher. The binary in
//! `main.rs` only parses the CLI and starts [`telegram`].

pub mod cli;
pub mod telegram;
