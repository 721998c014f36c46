//! Currency ledger: balance changes with a paired audit record
//!
//! Every mutation and its `resource_logs` rows commit in one SQLite
//! transaction, so a transfer is never left debited but not credited.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};

use crate::config;
use crate::error::{AppError, AppResult};
use crate::storage::profiles::{self, UserProfile};
use crate::storage::{logs, with_connection, DbPool, LogEvent};
use crate::types::{Currency, LogPeriod};

/// Outcome of a completed transfer, with both profiles as they are afterwards
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub sender: UserProfile,
    pub recipient: UserProfile,
    pub currency: Currency,
    pub amount: i64,
}

/// Parses the amount of an `добавить` command. Any integer is accepted,
/// negative values included.
pub fn parse_amount(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidFormat("Неверное значение количества.".to_string()))
}

/// Parses the amount of a `передать` command; only positive integers pass.
pub fn parse_transfer_amount(raw: &str) -> AppResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(AppError::InvalidAmount(raw.to_string())),
    }
}

/// Adds `amount` to `telegram_id`'s balance and records it.
pub fn apply_add(
    conn: &mut Connection,
    telegram_id: i64,
    currency: Currency,
    amount: i64,
    at: DateTime<Utc>,
) -> AppResult<UserProfile> {
    let tx = conn.transaction()?;
    profiles::increment_balance(&tx, telegram_id, currency, amount)?;
    let profile = profiles::find_by_telegram_id(&tx, telegram_id)?.ok_or(AppError::NotFound)?;
    logs::append(&tx, &profile, amount, currency, at)?;
    tx.commit()?;
    Ok(profile)
}

/// Moves `amount` of `currency` from the sender to the holder of `recipient_handle`.
///
/// Checks run in this order: amount, sender, sender balance, recipient.
/// Sender and recipient may be the same profile.
pub fn apply_transfer(
    conn: &mut Connection,
    sender_id: i64,
    currency: Currency,
    recipient_handle: &str,
    amount: i64,
    at: DateTime<Utc>,
) -> AppResult<TransferReceipt> {
    if amount <= 0 {
        return Err(AppError::InvalidAmount(amount.to_string()));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let sender = profiles::find_by_telegram_id(&tx, sender_id)?.ok_or(AppError::NotFound)?;
    if sender.balance(currency) < amount {
        return Err(AppError::InsufficientFunds(currency));
    }

    let handle = recipient_handle.trim().trim_start_matches('@').to_lowercase();
    let recipient =
        profiles::find_by_username(&tx, &handle)?.ok_or_else(|| AppError::RecipientNotFound(handle.clone()))?;

    if !profiles::debit_if_covered(&tx, sender.telegram_id, currency, amount)? {
        return Err(AppError::InsufficientFunds(currency));
    }
    profiles::increment_balance(&tx, recipient.telegram_id, currency, amount)?;

    logs::append(&tx, &sender, -amount, currency, at)?;
    logs::append(&tx, &recipient, amount, currency, at)?;

    let sender_after = profiles::find_by_telegram_id(&tx, sender.telegram_id)?.ok_or(AppError::NotFound)?;
    let recipient_after = profiles::find_by_telegram_id(&tx, recipient.telegram_id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;

    Ok(TransferReceipt {
        sender: sender_after,
        recipient: recipient_after,
        currency,
        amount,
    })
}

/// Adds `amount` (possibly negative) to a balance; returns the updated profile.
pub async fn add(pool: &DbPool, telegram_id: i64, currency: Currency, amount: i64) -> AppResult<UserProfile> {
    let profile = with_connection(pool, config::store::query_timeout(), move |conn| {
        apply_add(conn, telegram_id, currency, amount, Utc::now())
    })
    .await?;
    log::info!("Ledger: {} {:+} {} (now {})", telegram_id, amount, currency, profile.balance(currency));
    Ok(profile)
}

/// Current value of one balance
pub async fn balance(pool: &DbPool, telegram_id: i64, currency: Currency) -> AppResult<i64> {
    with_connection(pool, config::store::query_timeout(), move |conn| {
        profiles::find_by_telegram_id(conn, telegram_id)?
            .map(|profile| profile.balance(currency))
            .ok_or(AppError::NotFound)
    })
    .await
}

/// Transfers between profiles atomically; see [`apply_transfer`].
pub async fn transfer(
    pool: &DbPool,
    sender_id: i64,
    currency: Currency,
    recipient_handle: &str,
    amount: i64,
) -> AppResult<TransferReceipt> {
    let handle = recipient_handle.to_string();
    let receipt = with_connection(pool, config::store::query_timeout(), move |conn| {
        apply_transfer(conn, sender_id, currency, &handle, amount, Utc::now())
    })
    .await?;
    log::info!(
        "Ledger: transfer {} {} from {} to {}",
        amount,
        currency,
        receipt.sender.telegram_id,
        receipt.recipient.telegram_id
    );
    Ok(receipt)
}

/// Log rows of the last `period`, never looking past the retention window
pub async fn log_report(pool: &DbPool, period: LogPeriod) -> AppResult<Vec<LogEvent>> {
    let window = period.duration().min(config::logs::retention());
    let since = Utc::now() - window;
    with_connection(pool, config::store::scan_timeout(), move |conn| logs::since(conn, since)).await
}

/// Drops log rows older than the retention window
pub async fn purge_expired(pool: &DbPool) -> AppResult<usize> {
    let cutoff = Utc::now() - config::logs::retention();
    with_connection(pool, config::store::scan_timeout(), move |conn| {
        logs::purge_older_than(conn, cutoff)
    })
    .await
}
