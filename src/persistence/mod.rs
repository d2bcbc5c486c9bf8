//! Persistence layer modules.

mod collection;
pub mod db;
pub mod event_repo;
pub mod kv_store;
pub mod note_repo;
pub mod schema;
pub mod settings_repo;
pub mod task_repo;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
