//! Slash-command parsing
//!
//! Commands are Russian phrases typed after a `/`. [`parse`] turns the text of
//! one message into a [`Command`]; argument errors come back as
//! [`AppError::InvalidFormat`] / [`AppError::InvalidAmount`] carrying the usage
//! hint, unmatched phrases as [`AppError::UnknownCommand`].

use crate::error::{AppError, AppResult};
use crate::ledger::{parse_amount, parse_transfer_amount};
use crate::types::{Currency, LogPeriod, ProfileField};

const HELP_ALIASES: &[&str] = &[
    "помоги",
    "помощь",
    "я забыл",
    "забыл",
    "список команд",
    "что ты умеешь",
    "что ты делаешь",
];

const START_EVENT_VERB: &str = "начатьивент";

const CURRENCY_HINT: &str = "Используйте 'обломки' или 'пиастры'.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// регистрация
    Register,
    /// где ром
    DropOwnRegistration,
    /// анкета
    ShowProfile,
    /// статистика
    Stats,
    /// удалить анкету
    DeleteProfile,
    Help,
    /// изменить <поле> <значение>
    Edit { field: ProfileField, value: String },
    /// добавить <валюта> <n>
    Add { currency: Currency, amount: i64 },
    /// потерять <валюта>
    ShowBalance { currency: Currency },
    /// передать <валюта> @handle <n>
    Transfer {
        currency: Currency,
        recipient: String,
        amount: i64,
    },
    /// живой
    ResetSessions,
    /// список анкет
    ListProfiles,
    /// полный список анкет
    FullListProfiles,
    /// анкета <id>
    ShowProfileById(i64),
    /// датьадмин @handle
    GrantAdmin(String),
    /// чек лог день|неделя|месяц
    CheckLog(LogPeriod),
    /// начатьивент name, a, b (raw arguments)
    StartEvent(String),
}

impl Command {
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Command::ResetSessions
                | Command::ListProfiles
                | Command::FullListProfiles
                | Command::ShowProfileById(_)
                | Command::GrantAdmin(_)
                | Command::CheckLog(_)
                | Command::StartEvent(_)
        )
    }
}

/// Returns the command body of a slash message: the leading `/` removed and a
/// `@botname` suffix cut from the first word. `None` for ordinary messages.
pub fn normalize_command_text(text: &str) -> Option<String> {
    let body = text.trim_start().strip_prefix('/')?;
    let first_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let (first, rest) = body.split_at(first_end);
    let first = first.split('@').next().unwrap_or_default();
    Some(format!("{}{}", first, rest).trim().to_string())
}

/// Whether `body` addresses an administrator command, whatever its arguments.
///
/// Callers check rights with this before [`parse`], so a non-admin never sees
/// the usage hints of admin verbs.
pub fn is_admin_verb(body: &str) -> bool {
    let lowered: Vec<String> = body.split_whitespace().map(str::to_lowercase).collect();
    let words: Vec<&str> = lowered.iter().map(String::as_str).collect();

    match words.as_slice() {
        ["живой"] | ["список", "анкет"] | ["полный", "список", "анкет"] => true,
        ["датьадмин", ..] => true,
        ["анкета", _, ..] => true,
        ["чек", "лог", ..] => true,
        _ => strip_spaced_verb(body, START_EVENT_VERB).is_some(),
    }
}

/// Parses a command body as returned by [`normalize_command_text`].
pub fn parse(body: &str) -> AppResult<Command> {
    let words: Vec<&str> = body.split_whitespace().collect();
    let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let phrase = lowered.join(" ");

    match phrase.as_str() {
        "регистрация" => return Ok(Command::Register),
        "где ром" => return Ok(Command::DropOwnRegistration),
        "анкета" => return Ok(Command::ShowProfile),
        "статистика" => return Ok(Command::Stats),
        "удалить анкету" => return Ok(Command::DeleteProfile),
        "живой" => return Ok(Command::ResetSessions),
        "список анкет" => return Ok(Command::ListProfiles),
        "полный список анкет" => return Ok(Command::FullListProfiles),
        p if HELP_ALIASES.contains(&p) => return Ok(Command::Help),
        _ => {}
    }

    if let Some(args) = strip_spaced_verb(body, START_EVENT_VERB) {
        return Ok(Command::StartEvent(args.trim().to_string()));
    }

    let Some(verb) = lowered.first() else {
        return Err(AppError::UnknownCommand);
    };

    match verb.as_str() {
        "анкета" => {
            let id = words
                .get(1)
                .and_then(|raw| raw.parse::<i64>().ok())
                .ok_or_else(|| usage("Укажите айди анкеты. Пример: анкета 12"))?;
            Ok(Command::ShowProfileById(id))
        }
        "датьадмин" => {
            let handle = words
                .get(1)
                .map(|raw| normalize_handle(raw))
                .filter(|h| !h.is_empty())
                .ok_or_else(|| usage("Пример: датьадмин @username"))?;
            Ok(Command::GrantAdmin(handle))
        }
        "чек" if lowered.get(1).map(String::as_str) == Some("лог") => {
            let raw = lowered
                .get(2)
                .ok_or_else(|| usage("Укажите период для логов: день, неделя или месяц. Пример: чек лог день"))?;
            let period = raw
                .parse::<LogPeriod>()
                .map_err(|_| usage("Неверный период. Используйте: день, неделя или месяц."))?;
            Ok(Command::CheckLog(period))
        }
        "изменить" => {
            if words.len() < 3 {
                return Err(usage("Например: изменить имя НовоеИмя"));
            }
            let field = words[1]
                .parse::<ProfileField>()
                .map_err(|_| usage("Поле для изменения не поддерживается."))?;
            Ok(Command::Edit {
                field,
                value: rest_after_words(body, 2).to_string(),
            })
        }
        "добавить" => {
            if words.len() < 3 {
                return Err(usage("Например: добавить обломки 5"));
            }
            let amount = parse_amount(words[2])?;
            let currency = parse_currency(words[1])?;
            Ok(Command::Add { currency, amount })
        }
        "потерять" => {
            let raw = words.get(1).ok_or_else(|| usage("Например: потерять обломки"))?;
            Ok(Command::ShowBalance {
                currency: parse_currency(raw)?,
            })
        }
        "передать" => {
            if words.len() < 4 {
                return Err(usage("Пример: передать обломки @username 5"));
            }
            let amount = parse_transfer_amount(words[3])?;
            let currency = parse_currency(words[1])?;
            Ok(Command::Transfer {
                currency,
                recipient: normalize_handle(words[2]),
                amount,
            })
        }
        _ => Err(AppError::UnknownCommand),
    }
}

fn usage(hint: &str) -> AppError {
    AppError::InvalidFormat(hint.to_string())
}

fn parse_currency(raw: &str) -> AppResult<Currency> {
    raw.parse::<Currency>().map_err(|_| usage(CURRENCY_HINT))
}

fn normalize_handle(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

/// Matches `verb` at the start of `body` case-insensitively, allowing
/// whitespace between its letters; returns what follows it.
fn strip_spaced_verb<'a>(body: &'a str, verb: &str) -> Option<&'a str> {
    let mut expected = verb.chars().peekable();
    for (idx, ch) in body.char_indices() {
        if expected.peek().is_none() {
            return Some(&body[idx..]);
        }
        if ch.is_whitespace() {
            continue;
        }
        let next = expected.next()?;
        if !ch.to_lowercase().eq(next.to_lowercase()) {
            return None;
        }
    }
    expected.peek().is_none().then_some("")
}

/// The text after the first `n` words, with inner spacing preserved
fn rest_after_words(body: &str, n: usize) -> &str {
    let mut rest = body.trim_start();
    for _ in 0..n {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest.trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parsed(text: &str) -> AppResult<Command> {
        parse(&normalize_command_text(text).unwrap())
    }

    #[test]
    fn test_normalize_requires_slash_and_strips_bot_name() {
        assert_eq!(normalize_command_text("анкета"), None);
        assert_eq!(normalize_command_text("/анкета@rum_bot").as_deref(), Some("анкета"));
        assert_eq!(
            normalize_command_text("/передать@rum_bot обломки @anne 5").as_deref(),
            Some("передать обломки @anne 5")
        );
        assert_eq!(normalize_command_text("/").as_deref(), Some(""));
    }

    #[test]
    fn test_user_phrases() {
        let table = [
            ("/регистрация", Command::Register),
            ("/Где  Ром", Command::DropOwnRegistration),
            ("/анкета", Command::ShowProfile),
            ("/статистика", Command::Stats),
            ("/удалить анкету", Command::DeleteProfile),
        ];
        for (text, expected) in table {
            assert_eq!(parsed(text).unwrap(), expected, "{text}");
        }
        for alias in HELP_ALIASES {
            assert_eq!(parsed(&format!("/{alias}")).unwrap(), Command::Help, "{alias}");
        }
    }

    #[test]
    fn test_admin_phrases() {
        let table = [
            ("/живой", Command::ResetSessions),
            ("/список анкет", Command::ListProfiles),
            ("/полный список анкет", Command::FullListProfiles),
            ("/анкета 12", Command::ShowProfileById(12)),
            ("/датьадмин @Anne", Command::GrantAdmin("anne".to_string())),
            ("/чек лог неделя", Command::CheckLog(LogPeriod::Week)),
            ("/начатьивент Шторм, 5, 10", Command::StartEvent("Шторм, 5, 10".to_string())),
            ("/Начать Ивент Шторм, 5, 10", Command::StartEvent("Шторм, 5, 10".to_string())),
        ];
        for (text, expected) in table {
            let command = parsed(text).unwrap();
            assert!(command.is_admin_only(), "{text}");
            assert_eq!(command, expected, "{text}");
        }
    }

    #[test]
    fn test_admin_verbs_are_recognised_before_parsing() {
        let admin_bodies = [
            "живой",
            "Список  Анкет",
            "полный список анкет",
            "анкета 12",
            "анкета abc",
            "датьадмин",
            "датьадмин @anne",
            "чек лог",
            "чек лог год",
            "начатьивент",
            "Начать Ивент Шторм, 5, 10",
        ];
        for body in admin_bodies {
            assert!(is_admin_verb(body), "{body}");
            if let Ok(command) = parse(body) {
                assert!(command.is_admin_only(), "{body}");
            }
        }

        let user_bodies = [
            "анкета",
            "регистрация",
            "где ром",
            "статистика",
            "удалить анкету",
            "помощь",
            "изменить имя Джек",
            "добавить обломки 5",
            "потерять пиастры",
            "передать обломки @anne 5",
            "чек",
            "списки",
        ];
        for body in user_bodies {
            assert!(!is_admin_verb(body), "{body}");
            if let Ok(command) = parse(body) {
                assert!(!command.is_admin_only(), "{body}");
            }
        }
    }

    #[test]
    fn test_edit_keeps_value_verbatim() {
        assert_eq!(
            parsed("/изменить Инвентарь Сабля,  Компас и РОМ").unwrap(),
            Command::Edit {
                field: ProfileField::Inventory,
                value: "Сабля,  Компас и РОМ".to_string(),
            }
        );
        assert!(matches!(parsed("/изменить имя"), Err(AppError::InvalidFormat(_))));
        assert!(matches!(parsed("/изменить баланс 100"), Err(AppError::InvalidFormat(_))));
    }

    #[test]
    fn test_currency_commands() {
        assert_eq!(
            parsed("/добавить Обломки -3").unwrap(),
            Command::Add {
                currency: Currency::Oblomki,
                amount: -3,
            }
        );
        assert_eq!(
            parsed("/потерять пиастры").unwrap(),
            Command::ShowBalance {
                currency: Currency::Piastry,
            }
        );
        assert_eq!(
            parsed("/передать пиастры @Mary 7").unwrap(),
            Command::Transfer {
                currency: Currency::Piastry,
                recipient: "mary".to_string(),
                amount: 7,
            }
        );
        assert!(!parsed("/передать пиастры @Mary 7").unwrap().is_admin_only());
    }

    #[test]
    fn test_transfer_validates_amount_before_currency() {
        assert!(matches!(parsed("/передать золото @mary 0"), Err(AppError::InvalidAmount(_))));
        assert!(matches!(parsed("/передать золото @mary 3"), Err(AppError::InvalidFormat(_))));
        assert!(matches!(parsed("/передать обломки @mary"), Err(AppError::InvalidFormat(_))));
    }

    #[test]
    fn test_malformed_arguments_get_usage() {
        for text in [
            "/добавить обломки",
            "/добавить обломки много",
            "/потерять",
            "/анкета abc",
            "/датьадмин",
            "/чек лог",
            "/чек лог год",
        ] {
            assert!(matches!(parsed(text), Err(AppError::InvalidFormat(_))), "{text}");
        }
    }

    #[test]
    fn test_unknown_commands() {
        for text in ["/", "/старт", "/чек баланс", "/удалить всё"] {
            assert!(matches!(parsed(text), Err(AppError::UnknownCommand)), "{text}");
        }
    }

    #[test]
    fn test_strip_spaced_verb() {
        assert_eq!(strip_spaced_verb("начатьивент x", "начатьивент"), Some(" x"));
        assert_eq!(strip_spaced_verb("НАЧАТЬ ИВЕНТ", "начатьивент"), Some(""));
        assert_eq!(strip_spaced_verb("начать", "начатьивент"), None);
        assert_eq!(strip_spaced_verb("начатьрейд", "начатьивент"), None);
    }
}
