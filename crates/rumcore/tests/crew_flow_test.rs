//! End-to-end flows through the public rumcore API against a file-backed store
//!
//! Run with: cargo test -p rumcore --test crew_flow_test

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use rumcore::commands::{normalize_command_text, parse, Command};
use rumcore::config;
use rumcore::events::{EventBoard, EventChoice, EventResponse};
use rumcore::ledger;
use rumcore::registration::{Advance, PhotoSize, Prompt, RegistrationInput, RegistrationSessions};
use rumcore::render;
use rumcore::storage::{create_pool, profiles, with_connection, DbPool, UserProfile};
use rumcore::types::{Currency, LogPeriod};
use rumcore::AppError;

const SUPERUSER: &str = "Old_Captain";

fn temp_pool() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crew.sqlite");
    let pool = create_pool(path.to_str().unwrap()).unwrap();
    (dir, pool)
}

fn text(value: &str) -> RegistrationInput {
    RegistrationInput::Text(value.to_string())
}

/// Walks the whole dialogue and returns the stored profile
async fn register(sessions: &RegistrationSessions, pool: &DbPool, telegram_id: i64, username: &str) -> UserProfile {
    assert_eq!(sessions.start(telegram_id, username).await, Prompt::Name);

    let answers = [
        ("Джек", Prompt::Race),
        ("Человек", Prompt::Age),
        ("31", Prompt::HeightWeight),
        ("180/75", Prompt::Gender),
        ("М", Prompt::Photo),
    ];
    for (answer, next) in answers {
        let step = sessions.advance(pool, telegram_id, text(answer)).await.unwrap();
        assert_eq!(step, Advance::Prompt(next));
    }

    let photo = RegistrationInput::Photo(vec![
        PhotoSize {
            file_id: format!("small-{telegram_id}"),
            width: 90,
            height: 90,
        },
        PhotoSize {
            file_id: format!("large-{telegram_id}"),
            width: 1280,
            height: 960,
        },
    ]);
    match sessions.advance(pool, telegram_id, photo).await.unwrap() {
        Advance::Completed(profile) => profile,
        other => panic!("registration did not complete: {other:?}"),
    }
}

fn command(raw: &str) -> Command {
    parse(&normalize_command_text(raw).unwrap()).unwrap()
}

#[tokio::test]
async fn test_registration_then_transfer_then_log_report() {
    let (_dir, pool) = temp_pool();
    let sessions = RegistrationSessions::new(SUPERUSER);

    let jack = register(&sessions, &pool, 100, "Jack_S").await;
    let anne = register(&sessions, &pool, 200, "@Anne").await;

    assert!(!sessions.is_active(100).await);
    assert_eq!(jack.username, "jack_s");
    assert_eq!(jack.photo_file_id, "large-100");
    assert_eq!(jack.rank, config::profile::DEFAULT_RANK);
    assert_eq!(jack.team, config::profile::DEFAULT_TEAM);
    assert_eq!(jack.inventory, config::profile::DEFAULT_INVENTORY);
    assert_eq!((jack.oblomki, jack.piastry), (0, 0));
    assert!(!jack.is_admin);
    assert_ne!(jack.id, anne.id);

    let Command::Add { currency, amount } = command("/добавить пиастры 50") else {
        panic!("expected add");
    };
    let after_add = ledger::add(&pool, jack.telegram_id, currency, amount).await.unwrap();
    assert_eq!(after_add.piastry, 50);

    let Command::Transfer {
        currency,
        recipient,
        amount,
    } = command("/передать@rum_bot пиастры @ANNE 20")
    else {
        panic!("expected transfer");
    };
    let receipt = ledger::transfer(&pool, jack.telegram_id, currency, &recipient, amount)
        .await
        .unwrap();
    assert_eq!(receipt.sender.piastry, 30);
    assert_eq!(receipt.recipient.piastry, 20);
    assert_eq!(
        render::transfer_done(&receipt),
        "Передача выполнена успешно. Вы передали 20 пиастры пользователю @anne."
    );

    assert_eq!(ledger::balance(&pool, anne.telegram_id, Currency::Piastry).await.unwrap(), 20);

    let events = ledger::log_report(&pool, LogPeriod::Day).await.unwrap();
    let changes: Vec<(i64, i64)> = events.iter().map(|e| (e.telegram_id, e.change_amount)).collect();
    assert_eq!(changes, vec![(100, 50), (100, -20), (200, 20)]);
    assert!(events.iter().all(|e| e.resource == "пиастры"));
}

#[tokio::test]
async fn test_overdraft_leaves_ledger_untouched() {
    let (_dir, pool) = temp_pool();
    let sessions = RegistrationSessions::new(SUPERUSER);
    register(&sessions, &pool, 1, "sender").await;
    register(&sessions, &pool, 2, "receiver").await;

    let result = ledger::transfer(&pool, 1, Currency::Oblomki, "receiver", 5).await;
    assert!(matches!(result, Err(AppError::InsufficientFunds(Currency::Oblomki))));

    let result = ledger::transfer(&pool, 1, Currency::Oblomki, "@nobody", 0).await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    assert_eq!(ledger::balance(&pool, 2, Currency::Oblomki).await.unwrap(), 0);
    assert!(ledger::log_report(&pool, LogPeriod::Month).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_superuser_registration_is_marked_admin() {
    let (_dir, pool) = temp_pool();
    let sessions = RegistrationSessions::new(SUPERUSER);

    let captain = register(&sessions, &pool, 7, "old_captain").await;
    assert!(captain.is_admin);
    assert!(captain.name.contains(config::profile::ADMIN_MARK));
}

#[tokio::test]
async fn test_edit_then_reregister_keeps_record_id() {
    let (_dir, pool) = temp_pool();
    let sessions = RegistrationSessions::new(SUPERUSER);
    let first = register(&sessions, &pool, 42, "bosun").await;

    let Command::Edit { field, value } = command("/изменить инвентарь Сабля и компас") else {
        panic!("expected edit");
    };
    with_connection(&pool, config::store::query_timeout(), move |conn| {
        profiles::set_field(conn, 42, field, &value)
    })
    .await
    .unwrap();

    let edited = with_connection(&pool, config::store::query_timeout(), |conn| {
        profiles::find_by_telegram_id(conn, 42)
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(edited.inventory, "Сабля и компас");

    let second = register(&sessions, &pool, 42, "bosun").await;
    assert_eq!(second.id, first.id);
}

#[tokio::test]
async fn test_event_grants_to_participants_only() {
    let (_dir, pool) = temp_pool();
    let sessions = RegistrationSessions::new(SUPERUSER);
    register(&sessions, &pool, 10, "joiner").await;
    register(&sessions, &pool, 20, "skipper").await;

    let board = EventBoard::new();
    let Command::StartEvent(args) = command("/начатьивент Шторм, 5, 7") else {
        panic!("expected event");
    };
    let event = board.declare(&args).await.unwrap();
    assert_eq!((event.name.as_str(), event.oblomki, event.piastry), ("Шторм", 5, 7));

    match board.respond(&pool, 10, EventChoice::Participate).await.unwrap() {
        EventResponse::Joined { profile, .. } => assert_eq!((profile.oblomki, profile.piastry), (5, 7)),
        EventResponse::Skipped => panic!("participation was treated as a skip"),
    }
    assert_eq!(board.respond(&pool, 20, EventChoice::Skip).await.unwrap(), EventResponse::Skipped);

    assert_eq!(ledger::balance(&pool, 20, Currency::Piastry).await.unwrap(), 0);
    let logged: Vec<i64> = ledger::log_report(&pool, LogPeriod::Day)
        .await
        .unwrap()
        .iter()
        .map(|e| e.telegram_id)
        .collect();
    assert_eq!(logged, vec![10, 10]);
}

#[tokio::test]
async fn test_purge_keeps_recent_rows() {
    let (_dir, pool) = temp_pool();
    let sessions = RegistrationSessions::new(SUPERUSER);
    register(&sessions, &pool, 5, "fresh").await;
    ledger::add(&pool, 5, Currency::Oblomki, 3).await.unwrap();

    assert_eq!(ledger::purge_expired(&pool).await.unwrap(), 0);
    assert_eq!(ledger::log_report(&pool, LogPeriod::Week).await.unwrap().len(), 1);
}
