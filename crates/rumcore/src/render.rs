//! Reply texts
//!
//! Pure builders for everything the bot says, so replies can be checked
//! without a Telegram connection.

use chrono::Local;
use indoc::indoc;

use crate::config;
use crate::events::EventDetails;
use crate::ledger::TransferReceipt;
use crate::registration::Prompt;
use crate::storage::{LogEvent, UserProfile};
use crate::types::{Currency, ProfileField, StatKind};

pub const REGISTRATION_COMPLETE: &str = "Добро пожаловать на борт!";
pub const OWN_SESSION_DROPPED: &str = "Все выпили, Капитан!";
pub const ALL_SESSIONS_RESET: &str = "сэр, да, сэр!";
pub const DELETE_CONFIRM: &str = "Вы точно хотите удалить анкету?";
pub const PROFILE_DELETED: &str = "Анкета удалена.";
pub const DELETE_CANCELLED: &str = "Удаление отменено.";
pub const STATS_MENU: &str = "Выберите вариант статистики:";
pub const EVENT_SKIPPED: &str = "Вы отказались от участия в ивенте.";
pub const UNKNOWN_CHOICE: &str = "Неверный выбор.";
pub const NO_PROFILES: &str = "Нет анкет.";
pub const NO_STATS: &str = "Нет данных для отображения.";
pub const NO_LOGS: &str = "Нет логов за выбранный период.";
pub const PROFILE_ID_NOT_FOUND: &str = "Анкета с указанным ID не найдена.";
pub const ADMIN_TARGET_NOT_FOUND: &str = "Пользователь не найден или не зарегистрирован.";

const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";

const HELP: &str = indoc! {"
    Команды для обычных пользователей:
    • регистрация – начать регистрацию анкеты
    • анкета – показать свою анкету
    • где ром – сбросить незавершённую регистрацию
    • статистика – показать статистику участников
    • изменить [поле] [значение] – изменить указанное поле анкеты
    • добавить [обломки/пиастры] [количество] – пополнить ресурс
    • потерять [обломки/пиастры] – увидеть текущее значение ресурса
    • передать [обломки/пиастры] (@username) [количество] – передать ресурс другому участнику
    • удалить анкету – удалить свою анкету (требуется подтверждение)

    Поля анкеты: имя, раса, возраст, ростивес, пол, ранг, команда, инвентарь

    Команды для администрации:
    • список анкет – вывести краткий список анкет всех участников
    • полный список анкет – вывести каждую анкету с подробностями и фотографией
    • анкета (айди анкеты) – вывести анкету по заданному ID
    • датьадмин @username – назначить пользователя администратором
    • живой – сбросить все активные сеансы регистрации
    • чек лог [день/неделя/месяц] – вывести лог изменений ресурсов
    • начатьивент (имя ивента), (обломки), (пиастры) – запустить ивент

    Все команды начинаются с /
"};

pub fn help() -> &'static str {
    HELP
}

pub fn prompt(prompt: Prompt) -> &'static str {
    match prompt {
        Prompt::Name => "Введите имя и/или псевдоним:",
        Prompt::Race => "Введите расу:",
        Prompt::Age => "Введите возраст:",
        Prompt::HeightWeight => "Введите рост и вес (например: 173.6 см\\70 кг):",
        Prompt::Gender => "Введите пол:",
        Prompt::Photo => "Отправьте фотографию персонажа:",
    }
}

/// Full profile card, used as the photo caption
pub fn profile_caption(profile: &UserProfile) -> String {
    format!(
        "Имя: {}\nРаса: {}\nВозраст: {}\nРост и вес: {}\nПол: {}\nРанг: {}\nКоманда: {}\nОбломки: {}\nПиастры: {}\nИнвентарь: {}",
        profile.name,
        profile.race,
        profile.age,
        profile.height_weight,
        profile.gender,
        profile.rank,
        profile.team,
        profile.oblomki,
        profile.piastry,
        profile.inventory
    )
}

/// One line per profile: record id, name, handle, rank, team
pub fn profile_list(profiles: &[UserProfile]) -> String {
    if profiles.is_empty() {
        return NO_PROFILES.to_string();
    }
    profiles
        .iter()
        .map(|p| {
            format!(
                "ID: {} | Имя: {} | Username: @{} | Ранг: {} | Команда: {}",
                p.id, p.name, p.username, p.rank, p.team
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn stats_table(kind: StatKind, profiles: &[UserProfile]) -> String {
    let header = match kind {
        StatKind::Single(Currency::Piastry) => "Имя | Ранг | Команда | Пиастры",
        StatKind::Single(Currency::Oblomki) => "Имя | Ранг | Команда | Обломки",
        StatKind::Both => "Имя | Ранг | Команда | Обломки | Пиастры",
    };

    let mut lines = vec![header.to_string()];
    if profiles.is_empty() {
        lines.push(NO_STATS.to_string());
    }
    for p in profiles {
        let line = match kind {
            StatKind::Single(currency) => {
                format!("{} | {} | {} | {}", p.name, p.rank, p.team, p.balance(currency))
            }
            StatKind::Both => format!("{} | {} | {} | {} | {}", p.name, p.rank, p.team, p.oblomki, p.piastry),
        };
        lines.push(line);
    }
    lines.join("\n")
}

/// `date, name, @handle, amount, resource` per row, in local time
pub fn log_report(events: &[LogEvent]) -> String {
    if events.is_empty() {
        return NO_LOGS.to_string();
    }
    events
        .iter()
        .map(|e| {
            format!(
                "{}, {}, @{}, {}, {}",
                e.created_at.with_timezone(&Local).format(TIMESTAMP_FORMAT),
                e.name,
                e.username,
                e.change_amount,
                e.resource
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn field_changed(field: ProfileField) -> String {
    format!("Поле '{}' успешно изменено.", field.keyword())
}

pub fn balance_added(currency: Currency, amount: i64, total: i64) -> String {
    format!("Добавлено {} к {}. Теперь: {}", amount, currency, total)
}

pub fn balance_shown(currency: Currency, value: i64) -> String {
    format!("Текущее значение {}: {}", currency, value)
}

pub fn transfer_done(receipt: &TransferReceipt) -> String {
    format!(
        "Передача выполнена успешно. Вы передали {} {} пользователю @{}.",
        receipt.amount, receipt.currency, receipt.recipient.username
    )
}

pub fn admin_granted(handle: &str) -> String {
    format!("Пользователь @{} назначен администратором.", handle)
}

pub fn event_announcement(event: &EventDetails) -> String {
    format!(
        "Ивент '{}' запущен!\nУчастникам, принявшим ивент, будет зачислено:\nОбломков: {}\nПиастр: {}\nДата начала: {}",
        event.name,
        event.oblomki,
        event.piastry,
        event.started_at.with_timezone(&Local).format(TIMESTAMP_FORMAT)
    )
}

pub fn event_joined(profile: &UserProfile) -> String {
    format!(
        "Успешно! Валюта зачислена в ваш профиль.\nОбломки: {}\nПиастры: {}",
        profile.oblomki, profile.piastry
    )
}

/// Splits `text` into chunks of at most `limit` characters, preferring line
/// boundaries. Lines longer than `limit` are cut by character.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                current = piece.iter().collect();
                current_len = piece.len();
            }
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// [`split_message`] at the Telegram limit
pub fn telegram_chunks(text: &str) -> Vec<String> {
    split_message(text, config::telegram::MAX_MESSAGE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn profile(id: i64, name: &str, oblomki: i64, piastry: i64) -> UserProfile {
        UserProfile {
            id,
            telegram_id: id * 100,
            username: name.to_lowercase(),
            name: name.to_string(),
            race: "Человек".to_string(),
            age: "30".to_string(),
            height_weight: "180\\80".to_string(),
            gender: "М".to_string(),
            photo_file_id: String::new(),
            rank: "Ис".to_string(),
            team: "Наемник".to_string(),
            oblomki,
            piastry,
            inventory: "Пусто".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn test_profile_caption_lists_every_field() {
        let caption = profile_caption(&profile(1, "Jack", 3, 4));
        assert_eq!(
            caption,
            "Имя: Jack\nРаса: Человек\nВозраст: 30\nРост и вес: 180\\80\nПол: М\nРанг: Ис\nКоманда: Наемник\nОбломки: 3\nПиастры: 4\nИнвентарь: Пусто"
        );
    }

    #[test]
    fn test_profile_list() {
        assert_eq!(profile_list(&[]), NO_PROFILES);
        assert_eq!(
            profile_list(&[profile(1, "Jack", 0, 0), profile(2, "Anne", 0, 0)]),
            "ID: 1 | Имя: Jack | Username: @jack | Ранг: Ис | Команда: Наемник\n\
             ID: 2 | Имя: Anne | Username: @anne | Ранг: Ис | Команда: Наемник"
        );
    }

    #[test]
    fn test_stats_tables() {
        assert_eq!(stats_table(StatKind::Both, &[]), "Имя | Ранг | Команда | Обломки | Пиастры\nНет данных для отображения.");
        assert_eq!(
            stats_table(StatKind::Single(Currency::Piastry), &[profile(1, "Jack", 3, 40)]),
            "Имя | Ранг | Команда | Пиастры\nJack | Ис | Наемник | 40"
        );
        assert_eq!(
            stats_table(StatKind::Both, &[profile(1, "Jack", 3, 40)]),
            "Имя | Ранг | Команда | Обломки | Пиастры\nJack | Ис | Наемник | 3 | 40"
        );
    }

    #[test]
    fn test_log_report_lines() {
        assert_eq!(log_report(&[]), NO_LOGS);

        let at = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let report = log_report(&[LogEvent {
            created_at: at,
            telegram_id: 1,
            username: "anne".to_string(),
            name: "Anne".to_string(),
            change_amount: -10,
            resource: "обломки".to_string(),
        }]);
        let expected_date = at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string();
        assert_eq!(report, format!("{expected_date}, Anne, @anne, -10, обломки"));
    }

    #[test]
    fn test_event_announcement_mentions_grants() {
        let event = EventDetails {
            name: "Шторм".to_string(),
            oblomki: 5,
            piastry: 10,
            started_at: Utc::now(),
        };
        let text = event_announcement(&event);
        assert!(text.starts_with("Ивент 'Шторм' запущен!"));
        assert!(text.contains("Обломков: 5\nПиастр: 10"));
    }

    #[test]
    fn test_prompts_and_help() {
        assert_eq!(prompt(Prompt::Name), "Введите имя и/или псевдоним:");
        assert_eq!(prompt(Prompt::Photo), "Отправьте фотографию персонажа:");
        assert!(help().contains("передать [обломки/пиастры]"));
        assert!(help().contains("чек лог"));
    }

    #[test]
    fn test_split_message_on_line_boundaries() {
        assert_eq!(split_message("", 10), vec![String::new()]);
        assert_eq!(split_message("short", 10), vec!["short".to_string()]);
        assert_eq!(
            split_message("aaaa\nbbbb\ncccc", 9),
            vec!["aaaa\nbbbb".to_string(), "cccc".to_string()]
        );
    }

    #[test]
    fn test_split_message_cuts_long_lines() {
        let chunks = split_message("ёёёёёёё\nok", 3);
        assert_eq!(chunks, vec!["ёёё", "ёёё", "ё", "ok"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 3));
    }
}
