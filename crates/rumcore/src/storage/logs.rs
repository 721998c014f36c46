//! Log store adapter: immutable resource-change records

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::AppResult;
use crate::storage::profiles::UserProfile;
use crate::types::Currency;

/// One balance mutation as recorded in `resource_logs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub created_at: DateTime<Utc>,
    pub telegram_id: i64,
    pub username: String,
    pub name: String,
    pub change_amount: i64,
    pub resource: String,
}

/// Records a change of `change_amount` to `actor`'s `currency` balance.
pub fn append(
    conn: &Connection,
    actor: &UserProfile,
    change_amount: i64,
    currency: Currency,
    at: DateTime<Utc>,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO resource_logs (created_at, telegram_id, username, name, change_amount, resource)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            at.timestamp(),
            actor.telegram_id,
            actor.username,
            actor.name,
            change_amount,
            currency.as_str(),
        ],
    )?;
    Ok(())
}

/// All records at or after `since`, oldest first
pub fn since(conn: &Connection, since: DateTime<Utc>) -> AppResult<Vec<LogEvent>> {
    let mut stmt = conn.prepare(
        "SELECT created_at, telegram_id, username, name, change_amount, resource
         FROM resource_logs WHERE created_at >= ?1 ORDER BY created_at ASC, id ASC",
    )?;
    let events = stmt
        .query_map(params![since.timestamp()], |row| {
            let secs: i64 = row.get(0)?;
            Ok(LogEvent {
                created_at: DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default(),
                telegram_id: row.get(1)?,
                username: row.get(2)?,
                name: row.get(3)?,
                change_amount: row.get(4)?,
                resource: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(events)
}

/// Deletes records older than `cutoff`; returns how many were removed
pub fn purge_older_than(conn: &Connection, cutoff: DateTime<Utc>) -> AppResult<usize> {
    let removed = conn.execute(
        "DELETE FROM resource_logs WHERE created_at < ?1",
        params![cutoff.timestamp()],
    )?;
    if removed > 0 {
        log::info!("Purged {} expired resource log row(s)", removed);
    }
    Ok(removed)
}
