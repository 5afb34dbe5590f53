//! Persistence gateway: owns the one live store connection of a process.
//!
//! # Responsibility
//! - Parse the connection string and open the store on `connect()`.
//! - Hand out cheap, cloneable [`Database`] handles to callers.
//! - Release the connection on `close()` or when the gateway is dropped.
//!
//! # Invariants
//! - `connect()` is idempotent: a connected gateway never reconnects.
//! - `handle()` before `connect()` is a programming error and returns
//!   [`DbError::NotConnected`].
//! - Handles outliving `close()` observe [`DbError::Closed`].

use super::collection::Collection;
use super::open::{open_db, open_db_in_memory};
use super::{DbError, DbResult};
use log::{info, warn};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Logical database name selected on every connection.
pub const DATABASE_NAME: &str = "worldwide";
/// Environment variable holding the store connection string.
pub const DB_URI_ENV: &str = "WORLDWIDE_DB_URI";

const MEMORY_URI: &str = "sqlite::memory:";
const FILE_URI_PREFIX: &str = "sqlite://";

pub(crate) type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Where the document store lives, parsed from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// `sqlite::memory:`; private to the gateway, gone on close.
    Memory,
    /// `sqlite://<path>`; created on first connect.
    File(PathBuf),
}

impl ConnectionTarget {
    /// Parses `sqlite::memory:` or `sqlite://<path>`.
    pub fn parse(uri: &str) -> DbResult<Self> {
        let trimmed = uri.trim();
        if trimmed == MEMORY_URI {
            return Ok(Self::Memory);
        }

        match trimmed.strip_prefix(FILE_URI_PREFIX) {
            Some(path) if !path.trim().is_empty() => Ok(Self::File(PathBuf::from(path))),
            _ => Err(DbError::Connection {
                reason: format!(
                    "malformed connection string `{trimmed}`; expected `{MEMORY_URI}` or `{FILE_URI_PREFIX}<path>`"
                ),
            }),
        }
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Raw connection string; `None` when not configured.
    pub uri: Option<String>,
}

impl GatewayConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
        }
    }

    /// Reads the connection string from [`DB_URI_ENV`]; blank values count as absent.
    pub fn from_env() -> Self {
        let uri = std::env::var(DB_URI_ENV)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());
        Self { uri }
    }
}

/// Handle to the connected logical database.
///
/// Cloning is cheap; all clones share the gateway's connection.
#[derive(Debug, Clone)]
pub struct Database {
    name: &'static str,
    conn: SharedConnection,
}

impl Database {
    /// Logical database name (always [`DATABASE_NAME`]).
    pub fn name(&self) -> &str {
        self.name
    }

    /// Returns a handle to one named collection of this database.
    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(name, Arc::clone(&self.conn))
    }

    /// Whether the underlying connection is still open.
    pub fn is_open(&self) -> bool {
        self.conn
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

/// Owner of the store connection lifecycle.
#[derive(Debug)]
pub struct Gateway {
    config: GatewayConfig,
    database: Option<Database>,
}

impl Gateway {
    /// Creates a disconnected gateway; performs no I/O.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            database: None,
        }
    }

    /// Opens the store if needed and returns the database handle.
    ///
    /// # Errors
    /// - [`DbError::Connection`] when the connection string is absent,
    ///   malformed, or the store cannot be opened/bootstrapped.
    pub fn connect(&mut self) -> DbResult<Database> {
        if let Some(database) = self.database.as_ref() {
            return Ok(database.clone());
        }

        let uri = self.config.uri.as_deref().ok_or_else(|| DbError::Connection {
            reason: format!("{DB_URI_ENV} is not set"),
        })?;
        let target = ConnectionTarget::parse(uri)?;
        let conn = match &target {
            ConnectionTarget::Memory => open_db_in_memory(),
            ConnectionTarget::File(path) => open_db(path),
        }
        .map_err(|err| DbError::Connection {
            reason: err.to_string(),
        })?;

        let database = Database {
            name: DATABASE_NAME,
            conn: Arc::new(Mutex::new(Some(conn))),
        };
        info!(
            "event=gateway_connect module=db status=ok mode={} database={DATABASE_NAME}",
            target.mode()
        );
        self.database = Some(database.clone());
        Ok(database)
    }

    /// Returns the cached database handle.
    ///
    /// # Errors
    /// - [`DbError::NotConnected`] when `connect()` has not succeeded yet.
    pub fn handle(&self) -> DbResult<Database> {
        self.database.clone().ok_or(DbError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.database.is_some()
    }

    /// Releases the connection. No-op when never connected or already closed.
    pub fn close(&mut self) {
        let Some(database) = self.database.take() else {
            return;
        };

        let conn = match database.conn.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match conn.map(Connection::close) {
            Some(Ok(())) | None => {
                info!("event=gateway_close module=db status=ok database={DATABASE_NAME}");
            }
            Some(Err((_, err))) => {
                warn!(
                    "event=gateway_close module=db status=error database={DATABASE_NAME} error={err}"
                );
            }
        }
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionTarget, DbError};
    use std::path::PathBuf;

    #[test]
    fn parse_accepts_memory_and_file_targets() {
        assert_eq!(
            ConnectionTarget::parse(" sqlite::memory: ").unwrap(),
            ConnectionTarget::Memory
        );
        assert_eq!(
            ConnectionTarget::parse("sqlite:///var/lib/worldwide.db").unwrap(),
            ConnectionTarget::File(PathBuf::from("/var/lib/worldwide.db"))
        );
    }

    #[test]
    fn parse_rejects_unknown_schemes_and_empty_paths() {
        for uri in ["mongodb://localhost:27017", "sqlite://", "", "worldwide.db"] {
            let err = ConnectionTarget::parse(uri).unwrap_err();
            assert!(
                matches!(err, DbError::Connection { .. }),
                "uri `{uri}` gave {err}"
            );
        }
    }
}
