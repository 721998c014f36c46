//! Profile store adapter
//!
//! Plain synchronous functions over a `rusqlite::Connection`; async callers go
//! through [`crate::storage::with_connection`].

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::config;
use crate::error::{AppError, AppResult};
use crate::types::{Currency, ProfileField, ProfileOrder};

/// A registered character profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Store-assigned record id (what admins pass to `анкета <id>`)
    pub id: i64,
    /// Telegram user id, unique across profiles
    pub telegram_id: i64,
    /// Telegram handle, lowercase, may be empty
    pub username: String,
    pub name: String,
    pub race: String,
    pub age: String,
    pub height_weight: String,
    pub gender: String,
    pub photo_file_id: String,
    pub rank: String,
    pub team: String,
    pub oblomki: i64,
    pub piastry: i64,
    pub inventory: String,
    pub is_admin: bool,
}

impl UserProfile {
    pub fn balance(&self, currency: Currency) -> i64 {
        match currency {
            Currency::Oblomki => self.oblomki,
            Currency::Piastry => self.piastry,
        }
    }

    pub fn field(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Race => &self.race,
            ProfileField::Age => &self.age,
            ProfileField::HeightWeight => &self.height_weight,
            ProfileField::Gender => &self.gender,
            ProfileField::Rank => &self.rank,
            ProfileField::Team => &self.team,
            ProfileField::Inventory => &self.inventory,
        }
    }
}

/// Profile contents before the store assigns a record id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub telegram_id: i64,
    pub username: String,
    pub name: String,
    pub race: String,
    pub age: String,
    pub height_weight: String,
    pub gender: String,
    pub photo_file_id: String,
    pub rank: String,
    pub team: String,
    pub oblomki: i64,
    pub piastry: i64,
    pub inventory: String,
    pub is_admin: bool,
}

impl NewProfile {
    /// Empty profile with the registration defaults
    pub fn new(telegram_id: i64, username: &str) -> Self {
        Self {
            telegram_id,
            username: username.trim().trim_start_matches('@').to_lowercase(),
            name: String::new(),
            race: String::new(),
            age: String::new(),
            height_weight: String::new(),
            gender: String::new(),
            photo_file_id: String::new(),
            rank: config::profile::DEFAULT_RANK.to_string(),
            team: config::profile::DEFAULT_TEAM.to_string(),
            oblomki: 0,
            piastry: 0,
            inventory: config::profile::DEFAULT_INVENTORY.to_string(),
            is_admin: false,
        }
    }
}

const PROFILE_COLUMNS: &str = "id, telegram_id, username, name, race, age, height_weight, gender, \
     photo_file_id, rank, team, oblomki, piastry, inventory, is_admin";

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        telegram_id: row.get(1)?,
        username: row.get(2)?,
        name: row.get(3)?,
        race: row.get(4)?,
        age: row.get(5)?,
        height_weight: row.get(6)?,
        gender: row.get(7)?,
        photo_file_id: row.get(8)?,
        rank: row.get(9)?,
        team: row.get(10)?,
        oblomki: row.get(11)?,
        piastry: row.get(12)?,
        inventory: row.get(13)?,
        is_admin: row.get(14)?,
    })
}

pub fn find_by_telegram_id(conn: &Connection, telegram_id: i64) -> AppResult<Option<UserProfile>> {
    let sql = format!("SELECT {} FROM profiles WHERE telegram_id = ?1", PROFILE_COLUMNS);
    Ok(conn.query_row(&sql, params![telegram_id], row_to_profile).optional()?)
}

/// Looks a profile up by handle. The handle is matched lowercase with any
/// leading '@' removed; an empty handle never matches.
pub fn find_by_username(conn: &Connection, username: &str) -> AppResult<Option<UserProfile>> {
    let username = username.trim().trim_start_matches('@').to_lowercase();
    if username.is_empty() {
        return Ok(None);
    }
    let sql = format!(
        "SELECT {} FROM profiles WHERE username = ?1 ORDER BY id LIMIT 1",
        PROFILE_COLUMNS
    );
    Ok(conn.query_row(&sql, params![username], row_to_profile).optional()?)
}

pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<UserProfile>> {
    let sql = format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS);
    Ok(conn.query_row(&sql, params![id], row_to_profile).optional()?)
}

pub fn list_profiles(conn: &Connection, order: ProfileOrder) -> AppResult<Vec<UserProfile>> {
    let order_by = match order {
        ProfileOrder::Registration => "id ASC".to_string(),
        ProfileOrder::Name => "name COLLATE NOCASE ASC, id ASC".to_string(),
        ProfileOrder::BalanceDesc(currency) => format!("{} DESC, id ASC", currency.column()),
    };
    let sql = format!("SELECT {} FROM profiles ORDER BY {}", PROFILE_COLUMNS, order_by);
    let mut stmt = conn.prepare(&sql)?;
    let profiles = stmt
        .query_map([], row_to_profile)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(profiles)
}

/// Inserts the profile, or fully replaces the one with the same `telegram_id`.
///
/// A replaced profile keeps its record id; every other column, balances
/// included, takes the new value.
pub fn upsert_profile(conn: &Connection, profile: &NewProfile) -> AppResult<UserProfile> {
    conn.execute(
        "INSERT INTO profiles (telegram_id, username, name, race, age, height_weight, gender,
                               photo_file_id, rank, team, oblomki, piastry, inventory, is_admin)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(telegram_id) DO UPDATE SET
             username = excluded.username,
             name = excluded.name,
             race = excluded.race,
             age = excluded.age,
             height_weight = excluded.height_weight,
             gender = excluded.gender,
             photo_file_id = excluded.photo_file_id,
             rank = excluded.rank,
             team = excluded.team,
             oblomki = excluded.oblomki,
             piastry = excluded.piastry,
             inventory = excluded.inventory,
             is_admin = excluded.is_admin",
        params![
            profile.telegram_id,
            profile.username,
            profile.name,
            profile.race,
            profile.age,
            profile.height_weight,
            profile.gender,
            profile.photo_file_id,
            profile.rank,
            profile.team,
            profile.oblomki,
            profile.piastry,
            profile.inventory,
            profile.is_admin,
        ],
    )?;

    find_by_telegram_id(conn, profile.telegram_id)?.ok_or(AppError::NotFound)
}

/// Overwrites one descriptive field
pub fn set_field(conn: &Connection, telegram_id: i64, field: ProfileField, value: &str) -> AppResult<()> {
    let sql = format!("UPDATE profiles SET {} = ?1 WHERE telegram_id = ?2", field.column());
    let updated = conn.execute(&sql, params![value, telegram_id])?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Adds `delta` (which may be negative) to one balance in a single statement
pub fn increment_balance(conn: &Connection, telegram_id: i64, currency: Currency, delta: i64) -> AppResult<()> {
    let column = currency.column();
    let sql = format!("UPDATE profiles SET {col} = {col} + ?1 WHERE telegram_id = ?2", col = column);
    let updated = conn.execute(&sql, params![delta, telegram_id])?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Adds to both balances in a single statement
pub fn increment_balances(conn: &Connection, telegram_id: i64, oblomki: i64, piastry: i64) -> AppResult<()> {
    let updated = conn.execute(
        "UPDATE profiles SET oblomki = oblomki + ?1, piastry = piastry + ?2 WHERE telegram_id = ?3",
        params![oblomki, piastry, telegram_id],
    )?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Subtracts `amount` from one balance only if the balance covers it.
///
/// Returns `false` (and changes nothing) when the balance is too small.
pub fn debit_if_covered(conn: &Connection, telegram_id: i64, currency: Currency, amount: i64) -> AppResult<bool> {
    let sql = format!(
        "UPDATE profiles SET {col} = {col} - ?1 WHERE telegram_id = ?2 AND {col} >= ?1",
        col = currency.column()
    );
    Ok(conn.execute(&sql, params![amount, telegram_id])? == 1)
}

pub fn delete_profile(conn: &Connection, telegram_id: i64) -> AppResult<()> {
    let deleted = conn.execute("DELETE FROM profiles WHERE telegram_id = ?1", params![telegram_id])?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Appends the admin mark to a name unless it is already there
pub fn with_admin_mark(name: &str) -> String {
    if name.contains(config::profile::ADMIN_MARK) {
        name.to_string()
    } else if name.is_empty() {
        config::profile::ADMIN_MARK.to_string()
    } else {
        format!("{} {}", name, config::profile::ADMIN_MARK)
    }
}

/// Grants administrator rights: marks the name and sets the flag
pub fn mark_admin(conn: &Connection, telegram_id: i64) -> AppResult<UserProfile> {
    let profile = find_by_telegram_id(conn, telegram_id)?.ok_or(AppError::NotFound)?;
    conn.execute(
        "UPDATE profiles SET is_admin = 1, name = ?1 WHERE telegram_id = ?2",
        params![with_admin_mark(&profile.name), telegram_id],
    )?;
    find_by_telegram_id(conn, telegram_id)?.ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::memory_conn;
    use pretty_assertions::assert_eq;

    fn sample(telegram_id: i64, username: &str, name: &str) -> NewProfile {
        let mut profile = NewProfile::new(telegram_id, username);
        profile.name = name.to_string();
        profile.race = "Человек".to_string();
        profile
    }

    #[test]
    fn test_new_profile_defaults() {
        let profile = NewProfile::new(7, "@Jack_Sparrow");
        assert_eq!(profile.username, "jack_sparrow");
        assert_eq!(profile.rank, "Ис");
        assert_eq!(profile.team, "Наемник");
        assert_eq!(profile.inventory, "Пусто");
        assert_eq!((profile.oblomki, profile.piastry), (0, 0));
        assert!(!profile.is_admin);
    }

    #[test]
    fn test_upsert_inserts_then_replaces_keeping_id() {
        let conn = memory_conn();
        let first = upsert_profile(&conn, &sample(1, "anne", "Anne")).unwrap();
        increment_balance(&conn, 1, Currency::Piastry, 50).unwrap();

        let replaced = upsert_profile(&conn, &sample(1, "anne", "Anne Bonny")).unwrap();
        assert_eq!(replaced.id, first.id);
        assert_eq!(replaced.name, "Anne Bonny");
        assert_eq!(replaced.piastry, 0);
        assert_eq!(list_profiles(&conn, ProfileOrder::Registration).unwrap().len(), 1);
    }

    #[test]
    fn test_find_by_username_normalizes_handle() {
        let conn = memory_conn();
        upsert_profile(&conn, &sample(1, "Anne", "Anne")).unwrap();
        upsert_profile(&conn, &sample(2, "", "Nameless")).unwrap();

        assert_eq!(find_by_username(&conn, "@ANNE").unwrap().unwrap().telegram_id, 1);
        assert!(find_by_username(&conn, "").unwrap().is_none());
        assert!(find_by_username(&conn, "@").unwrap().is_none());
    }

    #[test]
    fn test_set_field_changes_only_that_field() {
        let conn = memory_conn();
        let before = upsert_profile(&conn, &sample(1, "anne", "Anne")).unwrap();
        set_field(&conn, 1, ProfileField::Inventory, "Сабля, Компас").unwrap();

        let after = find_by_telegram_id(&conn, 1).unwrap().unwrap();
        assert_eq!(after.inventory, "Сабля, Компас");
        assert_eq!(UserProfile { inventory: before.inventory.clone(), ..after }, before);
    }

    #[test]
    fn test_updates_of_missing_profile_are_not_found() {
        let conn = memory_conn();
        assert!(matches!(set_field(&conn, 9, ProfileField::Name, "x"), Err(AppError::NotFound)));
        assert!(matches!(
            increment_balance(&conn, 9, Currency::Oblomki, 1),
            Err(AppError::NotFound)
        ));
        assert!(matches!(delete_profile(&conn, 9), Err(AppError::NotFound)));
        assert!(matches!(mark_admin(&conn, 9), Err(AppError::NotFound)));
    }

    #[test]
    fn test_debit_if_covered() {
        let conn = memory_conn();
        upsert_profile(&conn, &sample(1, "anne", "Anne")).unwrap();
        increment_balance(&conn, 1, Currency::Oblomki, 10).unwrap();

        assert!(!debit_if_covered(&conn, 1, Currency::Oblomki, 11).unwrap());
        assert!(debit_if_covered(&conn, 1, Currency::Oblomki, 10).unwrap());
        assert_eq!(find_by_telegram_id(&conn, 1).unwrap().unwrap().oblomki, 0);
    }

    #[test]
    fn test_list_profiles_orders() {
        let conn = memory_conn();
        upsert_profile(&conn, &sample(1, "a", "Charlie")).unwrap();
        upsert_profile(&conn, &sample(2, "b", "alice")).unwrap();
        upsert_profile(&conn, &sample(3, "c", "Bob")).unwrap();
        increment_balance(&conn, 3, Currency::Piastry, 30).unwrap();
        increment_balance(&conn, 1, Currency::Piastry, 10).unwrap();

        let by_name: Vec<_> = list_profiles(&conn, ProfileOrder::Name)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(by_name, vec!["alice", "Bob", "Charlie"]);

        let richest: Vec<_> = list_profiles(&conn, ProfileOrder::BalanceDesc(Currency::Piastry))
            .unwrap()
            .into_iter()
            .map(|p| p.telegram_id)
            .collect();
        assert_eq!(richest, vec![3, 1, 2]);
    }

    #[test]
    fn test_mark_admin_appends_mark_once() {
        let conn = memory_conn();
        upsert_profile(&conn, &sample(1, "anne", "Anne")).unwrap();

        let first = mark_admin(&conn, 1).unwrap();
        let second = mark_admin(&conn, 1).unwrap();
        assert!(first.is_admin);
        assert_eq!(first.name, "Anne 🏴‍☠️");
        assert_eq!(second.name, "Anne 🏴‍☠️");
    }
}
