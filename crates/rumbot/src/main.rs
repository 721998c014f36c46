use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;
use tokio::time::{interval, sleep};

use rumbot::cli::{Cli, Commands};
use rumbot::telegram::{create_bot, schema, HandlerDeps};
use rumcore::config;
use rumcore::ledger;
use rumcore::logging::{init_logger, log_startup_configuration};
use rumcore::storage::{create_pool, DbPool};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics inside the dispatcher instead of losing them
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env must be loaded before the first config value is read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) => run_bot().await,
        Some(Commands::PurgeLogs) => run_purge_logs().await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot().await
        }
    }
}

/// One-shot retention purge
async fn run_purge_logs() -> Result<()> {
    let pool = create_pool(&config::DATABASE_PATH)?;
    let removed = ledger::purge_expired(&pool).await?;
    log::info!("Removed {} resource log row(s) older than {} days", removed, config::logs::RETENTION_DAYS);
    Ok(())
}

/// Hourly retention purge for the lifetime of the process
fn start_log_purge_task(pool: Arc<DbPool>) {
    tokio::spawn(async move {
        let mut ticker = interval(config::logs::purge_interval());
        loop {
            ticker.tick().await;
            if let Err(e) = ledger::purge_expired(&pool).await {
                log::warn!("Resource log purge failed: {}", e);
            }
        }
    });
}

async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration();

    let db_pool = Arc::new(create_pool(&config::DATABASE_PATH)?);
    let bot = create_bot()?;

    match bot.get_me().await {
        Ok(me) => log::info!("Authorized as @{}", me.username()),
        Err(e) => log::warn!("Failed to fetch bot info: {}. Continuing anyway.", e),
    }

    start_log_purge_task(Arc::clone(&db_pool));

    let deps = HandlerDeps::new(db_pool, &config::SUPERUSER_USERNAME);
    let handler = schema(deps);

    log::info!("📡 Ready to receive updates (long polling)");

    let mut retry_count = 0;
    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;

    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // A separate task so a panic in the dispatcher surfaces as a JoinError
        let handle = tokio::spawn(async move {
            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch()
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() => {
                log::error!("Dispatcher panicked: {}", join_err);
                if retry_count < max_retries {
                    retry_count += 1;
                    log::info!(
                        "Restarting dispatcher after panic (attempt {}/{})...",
                        retry_count,
                        max_retries
                    );
                    exponential_backoff(retry_count).await;
                } else {
                    log::error!("Max retries reached after panic. Exiting...");
                    break;
                }
            }
            Err(join_err) => {
                log::warn!("Dispatcher task was cancelled: {}", join_err);
                break;
            }
        }

        sleep(config::retry::dispatcher_delay()).await;
    }

    Ok(())
}

/// Exponential backoff delay for retries
async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    sleep(delay).await;
}
