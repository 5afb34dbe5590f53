//! JSON document collections over the shared store connection.
//!
//! # Responsibility
//! - Store flat JSON objects under store-generated UUID identifiers.
//! - Provide single-document insert/find/update/delete plus bulk
//!   count/delete for one named collection.
//!
//! # Invariants
//! - Identifiers are generated here and never accepted from callers on insert.
//! - `update_one` is a shallow `$set`: top-level keys are replaced wholesale.
//! - Every operation runs under the connection lock, so a single document
//!   is never observed half-written.

use super::gateway::SharedConnection;
use super::{DbError, DbResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Store-generated document identifier.
pub type DocumentId = Uuid;
/// Flat JSON object persisted as one document body.
pub type Document = Map<String, Value>;

/// A document together with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub body: Document,
}

/// Handle to one named collection.
#[derive(Debug, Clone)]
pub struct Collection {
    name: String,
    conn: SharedConnection,
}

impl Collection {
    pub(crate) fn new(name: impl Into<String>, conn: SharedConnection) -> Self {
        Self {
            name: name.into(),
            conn,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts `body` under a freshly generated identifier.
    pub fn insert_one(&self, body: &Document) -> DbResult<DocumentId> {
        let id = Uuid::new_v4();
        let encoded = serde_json::to_string(body)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);",
                params![self.name, id.to_string(), encoded],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn find_one(&self, id: DocumentId) -> DbResult<Option<StoredDocument>> {
        let raw = self.with_conn(|conn| {
            let body = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2;",
                    params![self.name, id.to_string()],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(body)
        })?;

        raw.map(|body| {
            Ok(StoredDocument {
                id,
                body: decode_body(&body)?,
            })
        })
        .transpose()
    }

    /// Returns every document, most recently inserted first.
    pub fn find_all(&self) -> DbResult<Vec<StoredDocument>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY seq DESC;",
            )?;
            let rows = stmt
                .query_map([self.name.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(id, body)| {
                Ok(StoredDocument {
                    id: parse_document_id(&id)?,
                    body: decode_body(&body)?,
                })
            })
            .collect()
    }

    /// Replaces the top-level keys present in `set` on one document.
    ///
    /// Returns the matched count (0 or 1).
    pub fn update_one(&self, id: DocumentId, set: &Document) -> DbResult<u64> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let current = tx
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2;",
                    params![self.name, id.to_string()],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            let Some(current) = current else {
                return Ok(0);
            };

            let mut body = decode_body(&current)?;
            for (key, value) in set {
                body.insert(key.clone(), value.clone());
            }
            tx.execute(
                "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2;",
                params![self.name, id.to_string(), serde_json::to_string(&body)?],
            )?;
            tx.commit()?;
            Ok(1)
        })
    }

    /// Deletes one document; returns the deleted count (0 or 1).
    pub fn delete_one(&self, id: DocumentId) -> DbResult<u64> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
                params![self.name, id.to_string()],
            )?;
            Ok(deleted as u64)
        })
    }

    /// Deletes every document of the collection.
    pub fn delete_many(&self) -> DbResult<u64> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM documents WHERE collection = ?1;",
                [self.name.as_str()],
            )?;
            Ok(deleted as u64)
        })
    }

    pub fn count_documents(&self) -> DbResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1;",
                [self.name.as_str()],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> DbResult<T>) -> DbResult<T> {
        let mut guard = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        let conn = guard.as_mut().ok_or(DbError::Closed)?;
        f(conn)
    }
}

fn decode_body(raw: &str) -> DbResult<Document> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(DbError::Document(serde::de::Error::custom(format!(
            "expected JSON object, found `{other}`"
        )))),
    }
}

fn parse_document_id(value: &str) -> DbResult<DocumentId> {
    Uuid::parse_str(value).map_err(|_| {
        DbError::Document(serde::de::Error::custom(format!(
            "invalid document id `{value}`"
        )))
    })
}
