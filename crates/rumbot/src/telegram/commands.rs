//! Slash-command handling for ordinary users
//!
//! Admin-only commands are checked here and delegated to [`super::admin`].

use teloxide::prelude::*;
use teloxide::types::{ChatId, Message};

use rumcore::commands::{self, normalize_command_text, Command};
use rumcore::config;
use rumcore::ledger;
use rumcore::render;
use rumcore::storage::{profiles, with_connection, UserProfile};
use rumcore::{AppError, AppResult};

use super::admin;
use super::bot::{send_profile, send_with_keyboard};
use super::handlers::{HandlerDeps, HandlerError, Sender};
use super::keyboards;
use super::Bot;

/// Entry point for every message starting with '/'
pub async fn handle_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(sender) = Sender::from_message(msg) else {
        return Ok(());
    };
    let Some(body) = msg.text().and_then(normalize_command_text) else {
        return Ok(());
    };

    log::info!("Command from {} (@{}): {}", sender.telegram_id, sender.username, body);

    if let Err(e) = run(bot, &sender, &body, deps).await {
        report_error(bot, sender.chat_id, &e).await;
    }
    Ok(())
}

/// Logs `err` and tells the chat what went wrong.
///
/// Failures to send the reply are only logged.
pub async fn report_error(bot: &Bot, chat_id: ChatId, err: &AppError) {
    if err.is_internal() {
        log::error!("Request in chat {} failed: {}", chat_id.0, err);
    } else {
        log::info!("Request in chat {} rejected: {}", chat_id.0, err);
    }

    if let Err(send_err) = bot.send_message(chat_id, err.user_message()).await {
        log::error!("Failed to send error reply to chat {}: {}", chat_id.0, send_err);
    }
}

/// Rights first, then arguments
async fn run(bot: &Bot, sender: &Sender, body: &str, deps: &HandlerDeps) -> AppResult<()> {
    admin::authorize(deps, sender, body).await?;
    let command = commands::parse(body)?;
    execute(bot, sender, command, deps).await
}

async fn execute(bot: &Bot, sender: &Sender, command: Command, deps: &HandlerDeps) -> AppResult<()> {
    let chat_id = sender.chat_id;
    match command {
        Command::Register => {
            let prompt = deps.sessions.start(sender.telegram_id, &sender.username).await;
            bot.send_message(chat_id, render::prompt(prompt)).await?;
        }
        Command::DropOwnRegistration => {
            deps.sessions.cancel(sender.telegram_id).await;
            bot.send_message(chat_id, render::OWN_SESSION_DROPPED).await?;
        }
        Command::ShowProfile => {
            let profile = load_profile(deps, sender.telegram_id).await?;
            send_profile(bot, chat_id, &profile).await?;
        }
        Command::Stats => {
            send_with_keyboard(bot, chat_id, render::STATS_MENU, keyboards::stats_menu()).await?;
        }
        Command::DeleteProfile => {
            send_with_keyboard(bot, chat_id, render::DELETE_CONFIRM, keyboards::delete_confirm()).await?;
        }
        Command::Help => {
            bot.send_message(chat_id, render::help()).await?;
        }
        Command::Edit { field, value } => {
            let telegram_id = sender.telegram_id;
            with_connection(&deps.db_pool, config::store::query_timeout(), move |conn| {
                profiles::set_field(conn, telegram_id, field, &value)
            })
            .await?;
            log::info!("User {} changed {}", telegram_id, field.keyword());
            bot.send_message(chat_id, render::field_changed(field)).await?;
        }
        Command::Add { currency, amount } => {
            let profile = ledger::add(&deps.db_pool, sender.telegram_id, currency, amount).await?;
            bot.send_message(chat_id, render::balance_added(currency, amount, profile.balance(currency)))
                .await?;
        }
        Command::ShowBalance { currency } => {
            let value = ledger::balance(&deps.db_pool, sender.telegram_id, currency).await?;
            bot.send_message(chat_id, render::balance_shown(currency, value)).await?;
        }
        Command::Transfer {
            currency,
            recipient,
            amount,
        } => {
            let receipt = ledger::transfer(&deps.db_pool, sender.telegram_id, currency, &recipient, amount).await?;
            bot.send_message(chat_id, render::transfer_done(&receipt)).await?;
        }
        Command::ResetSessions => admin::reset_sessions(bot, sender, deps).await?,
        Command::ListProfiles => admin::list_profiles(bot, sender, deps).await?,
        Command::FullListProfiles => admin::full_list_profiles(bot, sender, deps).await?,
        Command::ShowProfileById(id) => admin::show_profile_by_id(bot, sender, deps, id).await?,
        Command::GrantAdmin(handle) => admin::grant_admin(bot, sender, deps, &handle).await?,
        Command::CheckLog(period) => admin::check_log(bot, sender, deps, period).await?,
        Command::StartEvent(args) => admin::start_event(bot, sender, deps, &args).await?,
    }
    Ok(())
}

/// The caller's own profile
pub(crate) async fn load_profile(deps: &HandlerDeps, telegram_id: i64) -> AppResult<UserProfile> {
    with_connection(&deps.db_pool, config::store::query_timeout(), move |conn| {
        profiles::find_by_telegram_id(conn, telegram_id)?.ok_or(AppError::NotFound)
    })
    .await
}
