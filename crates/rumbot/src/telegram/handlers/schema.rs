//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use rumcore::commands::normalize_command_text;

use super::types::{HandlerDeps, HandlerError};
use crate::telegram::callbacks::handle_callback;
use crate::telegram::commands::handle_command;
use crate::telegram::registration::handle_registration_message;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// # Arguments
/// * `deps` - Handler dependencies (database pool, sessions, event board)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_registration = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Slash commands
        .branch(command_handler(deps_commands))
        // Everything else may be a registration answer
        .branch(registration_handler(deps_registration))
        // Inline keyboard buttons
        .branch(callback_handler(deps_callback))
}

fn is_command(msg: &Message) -> bool {
    msg.text().and_then(normalize_command_text).is_some()
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| is_command(&msg))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { handle_command(&bot, &msg, &deps).await }
        })
}

fn registration_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move { handle_registration_message(&bot, &msg, &deps).await }
    })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move { handle_callback(&bot, &q, &deps).await }
    })
}
