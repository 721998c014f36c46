use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, ErrorCode, InterruptHandle};
use tokio::task::JoinError;

use crate::config;
use crate::error::{AppError, AppResult};
use crate::storage::migrations::run_migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a pool of up to `config::store::POOL_MAX_SIZE` connections and
/// brings the schema up to date before returning.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
///
/// # Example
///
/// ```no_run
/// use rumcore::storage::create_pool;
///
/// let pool = create_pool("rumbot.sqlite")?;
/// # Ok::<(), rumcore::AppError>(())
/// ```
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(Duration::from_secs(config::store::QUERY_TIMEOUT_SECS)));
    let pool = Pool::builder().max_size(config::store::POOL_MAX_SIZE).build(manager)?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Where a store operation is, as seen by both the caller and the blocking thread
enum OpState {
    Queued,
    Running(InterruptHandle),
    Finished,
    Abandoned,
}

fn lock_state(state: &Mutex<OpState>) -> MutexGuard<'_, OpState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_interrupted(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::OperationInterrupted)
}

fn joined<T>(result: Result<AppResult<T>, JoinError>) -> AppResult<T> {
    result.map_err(|join_err| AppError::Task(join_err.to_string()))?
}

/// Runs a store operation on the blocking pool with a bounded wait.
///
/// [`AppError::StoreTimeout`] means the operation changed nothing: either it
/// never got a connection before `limit`, or its running statement was
/// interrupted and its transaction rolled back. There is no retry. An
/// operation that completes despite the interrupt reports its own result.
/// Multi-statement writes must run inside one transaction.
pub async fn with_connection<T, F>(pool: &DbPool, limit: Duration, op: F) -> AppResult<T>
where
    F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    let deadline = Instant::now() + limit;
    let state = Arc::new(Mutex::new(OpState::Queued));
    let worker_state = Arc::clone(&state);

    let mut task = tokio::task::spawn_blocking(move || {
        let wait = deadline.saturating_duration_since(Instant::now());
        let mut conn = pool.get_timeout(wait).map_err(|_| AppError::StoreTimeout(limit))?;
        {
            let mut current = lock_state(&worker_state);
            if matches!(*current, OpState::Abandoned) {
                return Err(AppError::StoreTimeout(limit));
            }
            *current = OpState::Running(conn.get_interrupt_handle());
        }
        let result = op(&mut *conn);
        *lock_state(&worker_state) = OpState::Finished;
        result
    });

    match tokio::time::timeout(limit, &mut task).await {
        Ok(result) => joined(result),
        Err(_) => {
            let previous = {
                let mut current = lock_state(&state);
                std::mem::replace(&mut *current, OpState::Abandoned)
            };
            match previous {
                OpState::Queued | OpState::Abandoned => {
                    log::warn!("Store operation not started within {:?}, abandoning", limit);
                    return Err(AppError::StoreTimeout(limit));
                }
                OpState::Running(handle) => handle.interrupt(),
                OpState::Finished => {}
            }

            match joined(task.await) {
                Err(AppError::Database(e)) if is_interrupted(&e) => {
                    log::warn!("Store operation exceeded {:?}, interrupted", limit);
                    Err(AppError::StoreTimeout(limit))
                }
                Err(AppError::StoreTimeout(_)) => {
                    log::warn!("Store operation not started within {:?}, abandoning", limit);
                    Err(AppError::StoreTimeout(limit))
                }
                other => other,
            }
        }
    }
}
