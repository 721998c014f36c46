//! Bot instance creation and outbound message helpers

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile, InlineKeyboardMarkup};

use rumcore::config;
use rumcore::render;
use rumcore::storage::UserProfile;
use rumcore::AppResult;

pub type Bot = teloxide::Bot;

/// Creates a Bot instance with custom or default API URL
///
/// The token comes from `BOT_TOKEN` (or `TELOXIDE_TOKEN`).
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Missing token, invalid URL or HTTP client failure
pub fn create_bot() -> anyhow::Result<Bot> {
    if config::BOT_TOKEN.is_empty() {
        anyhow::bail!("BOT_TOKEN / TELOXIDE_TOKEN is not set");
    }

    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(config::BOT_TOKEN.as_str(), client);

    let bot = match config::BOT_API_URL.as_deref() {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Sends `text`, split into several messages when it exceeds the Telegram limit
pub async fn send_long_text(bot: &Bot, chat_id: ChatId, text: &str) -> AppResult<()> {
    for chunk in render::telegram_chunks(text) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

pub async fn send_with_keyboard(bot: &Bot, chat_id: ChatId, text: &str, keyboard: InlineKeyboardMarkup) -> AppResult<()> {
    bot.send_message(chat_id, text).reply_markup(keyboard).await?;
    Ok(())
}

/// Sends the profile card: as a photo caption when a photo is stored,
/// otherwise as plain text
pub async fn send_profile(bot: &Bot, chat_id: ChatId, profile: &UserProfile) -> AppResult<()> {
    let caption = render::profile_caption(profile);
    if profile.photo_file_id.is_empty() {
        bot.send_message(chat_id, caption).await?;
    } else {
        bot.send_photo(chat_id, InputFile::file_id(FileId(profile.photo_file_id.clone())))
            .caption(caption)
            .await?;
    }
    Ok(())
}
