//! Administrator commands

use teloxide::prelude::*;

use rumcore::commands;
use rumcore::config;
use rumcore::ledger;
use rumcore::render;
use rumcore::storage::{profiles, with_connection};
use rumcore::types::{LogPeriod, ProfileOrder};
use rumcore::{AppError, AppResult};

use super::bot::{send_long_text, send_profile, send_with_keyboard};
use super::handlers::{HandlerDeps, Sender};
use super::keyboards;
use super::Bot;

/// Case-insensitive comparison of handles, ignoring a leading '@'
pub fn is_superuser(username: &str, superuser: &str) -> bool {
    let username = username.trim_start_matches('@');
    !username.is_empty() && username.to_lowercase() == superuser.trim_start_matches('@').to_lowercase()
}

/// Checks if the sender may run admin commands
///
/// The superuser always may; anyone else needs a profile with the admin flag.
pub async fn is_admin(deps: &HandlerDeps, sender: &Sender) -> AppResult<bool> {
    if is_superuser(&sender.username, &deps.superuser) {
        return Ok(true);
    }
    let telegram_id = sender.telegram_id;
    with_connection(&deps.db_pool, config::store::query_timeout(), move |conn| {
        Ok(profiles::find_by_telegram_id(conn, telegram_id)?.is_some_and(|p| p.is_admin))
    })
    .await
}

/// Rejects a non-admin sender of an admin command with [`AppError::Unauthorized`].
///
/// Runs on the raw command body, before its arguments are parsed.
pub async fn authorize(deps: &HandlerDeps, sender: &Sender, body: &str) -> AppResult<()> {
    if !commands::is_admin_verb(body) || is_admin(deps, sender).await? {
        return Ok(());
    }
    log::warn!(
        "User {} (@{}) tried admin command: {}",
        sender.telegram_id,
        sender.username,
        body
    );
    Err(AppError::Unauthorized)
}

pub async fn reset_sessions(bot: &Bot, sender: &Sender, deps: &HandlerDeps) -> AppResult<()> {
    let dropped = deps.sessions.reset_all().await;
    log::info!("Admin {} reset {} registration session(s)", sender.telegram_id, dropped);
    bot.send_message(sender.chat_id, render::ALL_SESSIONS_RESET).await?;
    Ok(())
}

pub async fn list_profiles(bot: &Bot, sender: &Sender, deps: &HandlerDeps) -> AppResult<()> {
    let all = with_connection(&deps.db_pool, config::store::scan_timeout(), |conn| {
        profiles::list_profiles(conn, ProfileOrder::Registration)
    })
    .await?;
    send_long_text(bot, sender.chat_id, &render::profile_list(&all)).await
}

/// One message per profile, with its photo when there is one
pub async fn full_list_profiles(bot: &Bot, sender: &Sender, deps: &HandlerDeps) -> AppResult<()> {
    let all = with_connection(&deps.db_pool, config::store::scan_timeout(), |conn| {
        profiles::list_profiles(conn, ProfileOrder::Registration)
    })
    .await?;

    if all.is_empty() {
        bot.send_message(sender.chat_id, render::NO_PROFILES).await?;
        return Ok(());
    }
    for profile in &all {
        send_profile(bot, sender.chat_id, profile).await?;
    }
    Ok(())
}

pub async fn show_profile_by_id(bot: &Bot, sender: &Sender, deps: &HandlerDeps, id: i64) -> AppResult<()> {
    let found = with_connection(&deps.db_pool, config::store::query_timeout(), move |conn| {
        profiles::find_by_id(conn, id)
    })
    .await?;

    match found {
        Some(profile) => send_profile(bot, sender.chat_id, &profile).await,
        None => {
            bot.send_message(sender.chat_id, render::PROFILE_ID_NOT_FOUND).await?;
            Ok(())
        }
    }
}

pub async fn grant_admin(bot: &Bot, sender: &Sender, deps: &HandlerDeps, handle: &str) -> AppResult<()> {
    let lookup = handle.to_string();
    let granted = with_connection(&deps.db_pool, config::store::query_timeout(), move |conn| {
        let tx = conn.transaction()?;
        let granted = match profiles::find_by_username(&tx, &lookup)? {
            Some(target) => Some(profiles::mark_admin(&tx, target.telegram_id)?),
            None => None,
        };
        tx.commit()?;
        Ok(granted)
    })
    .await?;

    match granted {
        Some(profile) => {
            log::info!(
                "Admin {} granted admin rights to {} (@{})",
                sender.telegram_id,
                profile.telegram_id,
                profile.username
            );
            bot.send_message(sender.chat_id, render::admin_granted(&profile.username))
                .await?;
        }
        None => {
            bot.send_message(sender.chat_id, render::ADMIN_TARGET_NOT_FOUND).await?;
        }
    }
    Ok(())
}

pub async fn check_log(bot: &Bot, sender: &Sender, deps: &HandlerDeps, period: LogPeriod) -> AppResult<()> {
    let events = ledger::log_report(&deps.db_pool, period).await?;
    log::info!("Admin {} requested {:?} log ({} rows)", sender.telegram_id, period, events.len());
    send_long_text(bot, sender.chat_id, &render::log_report(&events)).await
}

/// Declares the event and posts the announcement with its buttons
pub async fn start_event(bot: &Bot, sender: &Sender, deps: &HandlerDeps, args: &str) -> AppResult<()> {
    let event = deps.event_board.declare(args).await?;
    send_with_keyboard(
        bot,
        sender.chat_id,
        &render::event_announcement(&event),
        keyboards::event_choice(),
    )
    .await
}
