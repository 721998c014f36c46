//! Registration answers: any non-command message from a user mid-registration

use teloxide::prelude::*;
use teloxide::types::Message;

use rumcore::registration::{Advance, PhotoSize, RegistrationInput};
use rumcore::render;
use rumcore::AppResult;

use super::commands::report_error;
use super::handlers::{HandlerDeps, HandlerError, Sender};
use super::Bot;

/// Converts the message into a registration answer: its photo sizes, or its text
pub fn registration_input(msg: &Message) -> Option<RegistrationInput> {
    if let Some(sizes) = msg.photo() {
        return Some(RegistrationInput::Photo(
            sizes
                .iter()
                .map(|size| PhotoSize {
                    file_id: size.file.id.0.clone(),
                    width: size.width,
                    height: size.height,
                })
                .collect(),
        ));
    }
    msg.text().map(|text| RegistrationInput::Text(text.to_string()))
}

pub async fn handle_registration_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let (Some(sender), Some(input)) = (Sender::from_message(msg), registration_input(msg)) else {
        return Ok(());
    };

    if let Err(e) = advance(bot, &sender, input, deps).await {
        report_error(bot, sender.chat_id, &e).await;
    }
    Ok(())
}

async fn advance(bot: &Bot, sender: &Sender, input: RegistrationInput, deps: &HandlerDeps) -> AppResult<()> {
    match deps.sessions.advance(&deps.db_pool, sender.telegram_id, input).await? {
        Advance::NoSession | Advance::Ignored => {}
        Advance::Prompt(prompt) => {
            bot.send_message(sender.chat_id, render::prompt(prompt)).await?;
        }
        Advance::Completed(_) => {
            bot.send_message(sender.chat_id, render::REGISTRATION_COMPLETE).await?;
        }
    }
    Ok(())
}
