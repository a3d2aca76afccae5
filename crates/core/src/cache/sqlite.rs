//! SQLite cache store backend.
//!
//! Persists partitions in a single `entries` table keyed by
//! (partition, key), with WAL mode for concurrent readers. Database
//! operations run on a background thread via tokio-rusqlite.

use super::migrations;
use super::store::CacheStore;
use crate::{Error, Snapshot};
use async_trait::async_trait;
use std::path::Path;
use tokio_rusqlite::{Connection, params, rusqlite};

/// SQLite-backed [`CacheStore`].
#[derive(Clone, Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a store at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path.clone()).await.map_err(|e| Error::Store(e.into()))?;
        tracing::debug!(path = %path.display(), "opened cache store");
        Self::init(conn).await
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Store(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Store)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}

fn row_to_snapshot(row: &rusqlite::Row<'_>) -> Result<Snapshot, rusqlite::Error> {
    let headers_json: String = row.get(3)?;
    let headers = serde_json::from_str(&headers_json).unwrap_or_default();
    Ok(Snapshot {
        url: row.get(0)?,
        status: row.get::<_, i64>(1)? as u16,
        content_type: row.get(2)?,
        headers,
        body: row.get(4)?,
        fetched_at: row.get(5)?,
    })
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn get(&self, partition: &str, key: &str) -> Result<Option<Snapshot>, Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Snapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, content_type, headers_json, body, fetched_at
                     FROM entries WHERE partition = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![partition, key], row_to_snapshot);

                match result {
                    Ok(snapshot) => Ok(Some(snapshot)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, partition: &str, key: &str, snapshot: Snapshot) -> Result<(), Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        let headers_json = serde_json::to_string(&snapshot.headers).unwrap_or_else(|_| "[]".to_string());
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (partition, key, url, status, content_type, headers_json, body, fetched_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(partition, key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        fetched_at = excluded.fetched_at",
                    params![
                        partition,
                        key,
                        snapshot.url,
                        snapshot.status as i64,
                        snapshot.content_type,
                        headers_json,
                        snapshot.body,
                        snapshot.fetched_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, partition: &str, key: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND key = ?2",
                    params![partition, key],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn list_partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT partition FROM entries ORDER BY partition")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM entries WHERE partition = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
