//! Inline keyboard callbacks

use teloxide::prelude::*;

use rumcore::config;
use rumcore::events::{EventChoice, EventResponse};
use rumcore::render;
use rumcore::storage::{profiles, with_connection};
use rumcore::types::StatKind;
use rumcore::AppResult;

use super::bot::send_long_text;
use super::commands::report_error;
use super::handlers::{HandlerDeps, HandlerError, Sender};
use super::keyboards::{DELETE_NO, DELETE_YES};
use super::Bot;

/// Acknowledges the button press, then routes on the payload prefix
pub async fn handle_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(sender)) = (q.data.as_deref(), Sender::from_callback(q)) else {
        return Ok(());
    };
    log::info!("Callback from {} (@{}): {}", sender.telegram_id, sender.username, data);

    let result = if data.starts_with("deleteprofile:") {
        handle_delete(bot, &sender, deps, data).await
    } else if let Some(kind) = StatKind::from_callback_data(data) {
        handle_stats(bot, &sender, deps, kind).await
    } else if data.starts_with("event:") {
        handle_event(bot, &sender, deps, data).await
    } else {
        log::warn!("Unknown callback payload: {}", data);
        bot.send_message(sender.chat_id, render::UNKNOWN_CHOICE)
            .await
            .map(|_| ())
            .map_err(Into::into)
    };

    if let Err(e) = result {
        report_error(bot, sender.chat_id, &e).await;
    }
    Ok(())
}

async fn handle_delete(bot: &Bot, sender: &Sender, deps: &HandlerDeps, data: &str) -> AppResult<()> {
    match data {
        DELETE_YES => {
            let telegram_id = sender.telegram_id;
            with_connection(&deps.db_pool, config::store::query_timeout(), move |conn| {
                profiles::delete_profile(conn, telegram_id)
            })
            .await?;
            log::info!("User {} deleted their profile", telegram_id);
            bot.send_message(sender.chat_id, render::PROFILE_DELETED).await?;
        }
        DELETE_NO => {
            bot.send_message(sender.chat_id, render::DELETE_CANCELLED).await?;
        }
        _ => {
            bot.send_message(sender.chat_id, render::UNKNOWN_CHOICE).await?;
        }
    }
    Ok(())
}

async fn handle_stats(bot: &Bot, sender: &Sender, deps: &HandlerDeps, kind: StatKind) -> AppResult<()> {
    let order = kind.order();
    let rows = with_connection(&deps.db_pool, config::store::scan_timeout(), move |conn| {
        profiles::list_profiles(conn, order)
    })
    .await?;
    send_long_text(bot, sender.chat_id, &render::stats_table(kind, &rows)).await
}

async fn handle_event(bot: &Bot, sender: &Sender, deps: &HandlerDeps, data: &str) -> AppResult<()> {
    let Ok(choice) = data.parse::<EventChoice>() else {
        bot.send_message(sender.chat_id, render::UNKNOWN_CHOICE).await?;
        return Ok(());
    };

    let reply = match deps.event_board.respond(&deps.db_pool, sender.telegram_id, choice).await? {
        EventResponse::Joined { profile, .. } => render::event_joined(&profile),
        EventResponse::Skipped => render::EVENT_SKIPPED.to_string(),
    };
    bot.send_message(sender.chat_id, reply).await?;
    Ok(())
}
