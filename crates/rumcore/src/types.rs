use std::fmt;
use std::str::FromStr;

use strum::{EnumIter, IntoEnumIterator};

/// One of the two balances every profile carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Currency {
    Oblomki,
    Piastry,
}

impl Currency {
    /// Word users type in commands and see in replies
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Oblomki => "обломки",
            Currency::Piastry => "пиастры",
        }
    }

    /// Column holding this balance in the `profiles` table
    pub fn column(&self) -> &'static str {
        match self {
            Currency::Oblomki => "oblomki",
            Currency::Piastry => "piastry",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Currency::iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| format!("Unknown currency: {}", s))
    }
}

/// Profile attributes a user may edit with `изменить <поле> <значение>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ProfileField {
    Name,
    Race,
    Age,
    HeightWeight,
    Gender,
    Rank,
    Team,
    Inventory,
}

impl ProfileField {
    /// Keyword used in the edit command
    pub fn keyword(&self) -> &'static str {
        match self {
            ProfileField::Name => "имя",
            ProfileField::Race => "раса",
            ProfileField::Age => "возраст",
            ProfileField::HeightWeight => "ростивес",
            ProfileField::Gender => "пол",
            ProfileField::Rank => "ранг",
            ProfileField::Team => "команда",
            ProfileField::Inventory => "инвентарь",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Race => "race",
            ProfileField::Age => "age",
            ProfileField::HeightWeight => "height_weight",
            ProfileField::Gender => "gender",
            ProfileField::Rank => "rank",
            ProfileField::Team => "team",
            ProfileField::Inventory => "inventory",
        }
    }
}

impl FromStr for ProfileField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ProfileField::iter()
            .find(|f| f.keyword() == lowered)
            .ok_or_else(|| format!("Unknown profile field: {}", s))
    }
}

/// Window of the `чек лог` report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPeriod {
    Day,
    Week,
    Month,
}

impl LogPeriod {
    pub fn duration(&self) -> chrono::Duration {
        match self {
            LogPeriod::Day => chrono::Duration::days(1),
            LogPeriod::Week => chrono::Duration::days(7),
            LogPeriod::Month => chrono::Duration::days(30),
        }
    }
}

impl FromStr for LogPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "день" => Ok(LogPeriod::Day),
            "неделя" => Ok(LogPeriod::Week),
            "месяц" => Ok(LogPeriod::Month),
            _ => Err(format!("Unknown log period: {}", s)),
        }
    }
}

/// Sort order for multi-profile reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOrder {
    /// Registration order (record id ascending)
    Registration,
    /// Alphabetical by display name
    Name,
    /// Richest first in the given currency
    BalanceDesc(Currency),
}

/// Variant of the `статистика` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Single(Currency),
    Both,
}

impl StatKind {
    /// Callback payload of the stat menu button
    pub fn callback_data(&self) -> &'static str {
        match self {
            StatKind::Single(Currency::Piastry) => "stat:piastry",
            StatKind::Single(Currency::Oblomki) => "stat:oblomki",
            StatKind::Both => "stat:both",
        }
    }

    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data {
            "stat:piastry" => Some(StatKind::Single(Currency::Piastry)),
            "stat:oblomki" => Some(StatKind::Single(Currency::Oblomki)),
            "stat:both" => Some(StatKind::Both),
            _ => None,
        }
    }

    pub fn order(&self) -> ProfileOrder {
        match self {
            StatKind::Single(currency) => ProfileOrder::BalanceDesc(*currency),
            StatKind::Both => ProfileOrder::Name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_from_str_is_case_insensitive() {
        assert_eq!(Currency::from_str("обломки").unwrap(), Currency::Oblomki);
        assert_eq!(Currency::from_str("ПИАСТРЫ").unwrap(), Currency::Piastry);
        assert_eq!(Currency::from_str(" Пиастры ").unwrap(), Currency::Piastry);
        assert!(Currency::from_str("золото").is_err());
    }

    #[test]
    fn test_currency_columns() {
        assert_eq!(Currency::Oblomki.column(), "oblomki");
        assert_eq!(Currency::Piastry.column(), "piastry");
        assert_eq!(Currency::Piastry.to_string(), "пиастры");
    }

    #[test]
    fn test_profile_field_keywords_round_trip() {
        for field in ProfileField::iter() {
            assert_eq!(ProfileField::from_str(field.keyword()).unwrap(), field);
        }
        assert_eq!(ProfileField::from_str("РостИВес").unwrap(), ProfileField::HeightWeight);
        assert!(ProfileField::from_str("баланс").is_err());
    }

    #[test]
    fn test_log_period_durations() {
        assert_eq!(LogPeriod::from_str("день").unwrap().duration(), chrono::Duration::days(1));
        assert_eq!(LogPeriod::from_str("Неделя").unwrap().duration(), chrono::Duration::days(7));
        assert_eq!(LogPeriod::from_str("месяц").unwrap().duration(), chrono::Duration::days(30));
        assert!(LogPeriod::from_str("год").is_err());
    }

    #[test]
    fn test_stat_kind_callback_data() {
        for kind in [StatKind::Single(Currency::Piastry), StatKind::Single(Currency::Oblomki), StatKind::Both] {
            assert_eq!(StatKind::from_callback_data(kind.callback_data()), Some(kind));
        }
        assert_eq!(StatKind::from_callback_data("stat:gold"), None);
        assert_eq!(StatKind::Both.order(), ProfileOrder::Name);
        assert_eq!(
            StatKind::Single(Currency::Oblomki).order(),
            ProfileOrder::BalanceDesc(Currency::Oblomki)
        );
    }
}
