use std::borrow::Cow;
use std::time::Duration;

use thiserror::Error;

use crate::types::Currency;

/// Centralized error types for the application
///
/// Store failures, malformed input and business-rule violations all end up
/// here. Handlers turn them into replies with [`AppError::user_message`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(String),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// The caller (or the addressed record) has no profile
    #[error("Profile not found")]
    NotFound,

    /// Transfer target handle matches no profile
    #[error("Recipient @{0} not found")]
    RecipientNotFound(String),

    /// Malformed numeric or multi-part argument
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Debit exceeds the current balance
    #[error("Insufficient {0}")]
    InsufficientFunds(Currency),

    /// Non-positive or non-numeric transfer amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Store call exceeded its bound
    #[error("Store operation timed out after {0:?}")]
    StoreTimeout(Duration),

    /// Non-admin invoked an admin command
    #[error("Unauthorized")]
    Unauthorized,

    /// Event button pressed while no event is running
    #[error("No active event")]
    NoActiveEvent,

    /// Slash message matching no known phrase
    #[error("Unknown command")]
    UnknownCommand,

    /// Blocking store task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Human-readable reply for the chat
    pub fn user_message(&self) -> Cow<'static, str> {
        match self {
            AppError::NotFound => Cow::Borrowed("Анкета не найдена. Зарегистрируйтесь командой: регистрация"),
            AppError::RecipientNotFound(_) => {
                Cow::Borrowed("Профиль получателя не найден. Убедитесь, что пользователь зарегистрирован.")
            }
            AppError::InvalidFormat(hint) => Cow::Owned(format!("Неверный формат. {}", hint)),
            AppError::InsufficientFunds(currency) => {
                Cow::Owned(format!("У вас недостаточно {} для передачи.", currency))
            }
            AppError::InvalidAmount(_) => Cow::Borrowed("Неверное значение количества для передачи."),
            AppError::StoreTimeout(_) => Cow::Borrowed("База данных не отвечает. Попробуйте позже."),
            AppError::Unauthorized => Cow::Borrowed("У вас нет прав для выполнения этой команды."),
            AppError::NoActiveEvent => Cow::Borrowed("Нет активного ивента."),
            AppError::UnknownCommand => Cow::Borrowed("Неизвестная команда."),
            _ => Cow::Borrowed("Произошла ошибка. Попробуйте позже."),
        }
    }

    /// True for failures of the store itself rather than of the request
    pub fn is_internal(&self) -> bool {
        match self {
            AppError::Database(_)
            | AppError::DatabasePool(_)
            | AppError::Migration(_)
            | AppError::StoreTimeout(_)
            | AppError::Task(_) => true,
            #[cfg(feature = "telegram")]
            AppError::Telegram(_) => true,
            _ => false,
        }
    }
}
