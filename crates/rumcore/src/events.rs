//! Administrator-run events granting fixed amounts of both currencies

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::config;
use crate::error::{AppError, AppResult};
use crate::storage::profiles::{self, UserProfile};
use crate::storage::{logs, with_connection, DbPool};
use crate::types::Currency;

const USAGE: &str = "Используйте: начатьивент (Имя ивента), (число для обломков), (число для пиастр)";

/// The currently running event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    pub name: String,
    pub oblomki: i64,
    pub piastry: i64,
    pub started_at: DateTime<Utc>,
}

impl EventDetails {
    /// Parses `name, oblomki, piastry`. The name is everything before the last
    /// two commas and may itself contain commas.
    pub fn parse(args: &str, started_at: DateTime<Utc>) -> AppResult<Self> {
        let invalid = || AppError::InvalidFormat(USAGE.to_string());

        let mut parts = args.rsplitn(3, ',');
        let piastry = parts.next().ok_or_else(invalid)?;
        let oblomki = parts.next().ok_or_else(invalid)?;
        let name = parts.next().ok_or_else(invalid)?.trim();

        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            oblomki: oblomki.trim().parse().map_err(|_| invalid())?,
            piastry: piastry.trim().parse().map_err(|_| invalid())?,
            started_at,
        })
    }
}

/// Answer to the event announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventChoice {
    Participate,
    Skip,
}

impl EventChoice {
    pub fn callback_data(&self) -> &'static str {
        match self {
            EventChoice::Participate => "event:participate",
            EventChoice::Skip => "event:skip",
        }
    }
}

impl FromStr for EventChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event:participate" => Ok(EventChoice::Participate),
            "event:skip" => Ok(EventChoice::Skip),
            _ => Err(format!("Unknown event choice: {}", s)),
        }
    }
}

/// Effect of [`EventBoard::respond`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResponse {
    /// Grants applied; the profile as it is afterwards
    Joined { event: EventDetails, profile: UserProfile },
    Skipped,
}

/// Holder of the single current event
#[derive(Clone, Default)]
pub struct EventBoard {
    current: Arc<Mutex<Option<EventDetails>>>,
}

impl EventBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `args` and replaces the current event.
    ///
    /// On a parse error the previous event stays in place.
    pub async fn declare(&self, args: &str) -> AppResult<EventDetails> {
        let details = EventDetails::parse(args, Utc::now())?;
        let previous = self.current.lock().await.replace(details.clone());
        match previous {
            Some(old) => log::info!("Event '{}' replaced by '{}'", old.name, details.name),
            None => log::info!("Event '{}' started", details.name),
        }
        Ok(details)
    }

    pub async fn current(&self) -> Option<EventDetails> {
        self.current.lock().await.clone()
    }

    /// Applies a user's answer to the current event.
    ///
    /// Participating twice grants twice.
    pub async fn respond(&self, pool: &DbPool, telegram_id: i64, choice: EventChoice) -> AppResult<EventResponse> {
        let event = self.current().await.ok_or(AppError::NoActiveEvent)?;

        match choice {
            EventChoice::Skip => {
                log::info!("User {} skipped event '{}'", telegram_id, event.name);
                Ok(EventResponse::Skipped)
            }
            EventChoice::Participate => {
                let grant = event.clone();
                let profile = with_connection(pool, config::store::query_timeout(), move |conn| {
                    apply_grant(conn, telegram_id, &grant, Utc::now())
                })
                .await?;
                log::info!(
                    "User {} joined event '{}' (+{} обломков, +{} пиастр)",
                    telegram_id,
                    event.name,
                    event.oblomki,
                    event.piastry
                );
                Ok(EventResponse::Joined { event, profile })
            }
        }
    }
}

/// Adds the event's grants to both balances and logs each non-zero one
pub fn apply_grant(
    conn: &mut rusqlite::Connection,
    telegram_id: i64,
    event: &EventDetails,
    at: DateTime<Utc>,
) -> AppResult<UserProfile> {
    let tx = conn.transaction()?;
    profiles::increment_balances(&tx, telegram_id, event.oblomki, event.piastry)?;
    let profile = profiles::find_by_telegram_id(&tx, telegram_id)?.ok_or(AppError::NotFound)?;
    for (currency, amount) in [(Currency::Oblomki, event.oblomki), (Currency::Piastry, event.piastry)] {
        if amount != 0 {
            logs::append(&tx, &profile, amount, currency, at)?;
        }
    }
    tx.commit()?;
    Ok(profile)
}
