//! Document store bootstrap, gateway lifecycle and collection access.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing the document store.
//! - Apply schema migrations in deterministic order.
//! - Own the single live connection through [`Gateway`].
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No collection is reachable before migrations succeed.
//! - After [`Gateway::close`], every outstanding handle fails with
//!   [`DbError::Closed`] instead of touching a released connection.

use thiserror::Error;

pub mod collection;
mod gateway;
pub mod migrations;
mod open;

pub use collection::{Collection, Document, DocumentId, StoredDocument};
pub use gateway::{ConnectionTarget, Database, Gateway, GatewayConfig, DATABASE_NAME, DB_URI_ENV};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("cannot connect to document store: {reason}")]
    Connection { reason: String },
    #[error("document store is not connected; call Gateway::connect first")]
    NotConnected,
    #[error("document store connection is closed")]
    Closed,
    #[error("document store lock poisoned")]
    Poisoned,
    #[error("invalid document body: {0}")]
    Document(#[from] serde_json::Error),
}
