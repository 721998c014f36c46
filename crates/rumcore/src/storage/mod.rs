//! Database access: pool, migrations, profile and log adapters

pub mod db;
pub mod logs;
pub mod migrations;
pub mod profiles;

// Re-exports for convenience
pub use db::{create_pool, get_connection, with_connection, DbConnection, DbPool};
pub use logs::LogEvent;
pub use profiles::{NewProfile, UserProfile};
