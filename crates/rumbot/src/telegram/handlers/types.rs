//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::{CallbackQuery, ChatId, Message, User};

use rumcore::events::EventBoard;
use rumcore::registration::RegistrationSessions;
use rumcore::storage::DbPool;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub sessions: RegistrationSessions,
    pub event_board: EventBoard,
    /// Permanent administrator handle, without '@'
    pub superuser: Arc<str>,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>, superuser: &str) -> Self {
        let superuser = superuser.trim().trim_start_matches('@');
        Self {
            db_pool,
            sessions: RegistrationSessions::new(superuser),
            event_board: EventBoard::new(),
            superuser: Arc::from(superuser),
        }
    }
}

/// Who sent an update and where to answer it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub telegram_id: i64,
    /// Telegram handle as sent, may be empty
    pub username: String,
    pub chat_id: ChatId,
}

impl Sender {
    fn new(user: &User, chat_id: ChatId) -> Option<Self> {
        Some(Self {
            telegram_id: i64::try_from(user.id.0).ok()?,
            username: user.username.clone().unwrap_or_default(),
            chat_id,
        })
    }

    /// `None` for messages without an author (channel posts)
    pub fn from_message(msg: &Message) -> Option<Self> {
        Self::new(msg.from.as_ref()?, msg.chat.id)
    }

    /// Answers go to the chat holding the pressed button, or privately when
    /// that message is no longer accessible
    pub fn from_callback(q: &CallbackQuery) -> Option<Self> {
        let chat_id = q
            .message
            .as_ref()
            .map(|m| m.chat().id)
            .unwrap_or_else(|| ChatId::from(q.from.id));
        Self::new(&q.from, chat_id)
    }
}
