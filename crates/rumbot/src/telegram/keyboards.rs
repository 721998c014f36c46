//! Inline keyboards

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use rumcore::events::EventChoice;
use rumcore::types::{Currency, StatKind};

pub const DELETE_YES: &str = "deleteprofile:yes";
pub const DELETE_NO: &str = "deleteprofile:no";

/// Да / Нет under the deletion question
pub fn delete_confirm() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Да", DELETE_YES),
        InlineKeyboardButton::callback("Нет", DELETE_NO),
    ]])
}

pub fn stats_menu() -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = [
        ("Пиастры", StatKind::Single(Currency::Piastry)),
        ("Обломки", StatKind::Single(Currency::Oblomki)),
        ("Оба", StatKind::Both),
    ]
    .into_iter()
    .map(|(label, kind)| InlineKeyboardButton::callback(label, kind.callback_data()))
    .collect();
    InlineKeyboardMarkup::new(vec![buttons])
}

/// Участвую / Пропуск under an event announcement
pub fn event_choice() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Участвую", EventChoice::Participate.callback_data()),
        InlineKeyboardButton::callback("Пропуск", EventChoice::Skip.callback_data()),
    ]])
}
