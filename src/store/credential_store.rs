/// SQLite-backed credential store
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::store::{StoreError, StoreResult};

/// How long a writer waits for another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Credentials recorded for one logged-in session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Last login, seconds since the UNIX epoch
    pub timestamp: f64,
}

/// Durable keyed store of [`CredentialRecord`]s.
///
/// Every operation runs as one `IMMEDIATE` transaction, so several server
/// processes sharing the database file never lose each other's updates.
/// Failures are logged and reported as `false` / `None` / `0`.
#[derive(Clone)]
pub struct CredentialStore {
    conn: Arc<Mutex<Connection>>,
}

impl CredentialStore {
    /// Open or create the store at `path`, creating parent directories as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::InvalidPath(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        info!("Credential store opened at {}", path.display());
        Ok(store)
    }

    /// Open a private in-memory store (useful for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                key       TEXT PRIMARY KEY NOT NULL,
                host      TEXT NOT NULL,
                port      INTEGER NOT NULL,
                username  TEXT NOT NULL,
                password  TEXT NOT NULL,
                timestamp REAL NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert or overwrite the record for `key`, stamping it with the current time.
    pub fn save(&self, key: &str, host: &str, port: u16, username: &str, password: &str) -> bool {
        let record = CredentialRecord {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            timestamp: now_secs(),
        };
        match self.put(key, &record) {
            Ok(()) => {
                debug!("Saved credentials for {}", key);
                true
            }
            Err(e) => {
                error!("Error saving client state for {}: {}", key, e);
                false
            }
        }
    }

    /// Look up the record stored under `key`.
    pub fn get(&self, key: &str) -> Option<CredentialRecord> {
        let result = self.with_transaction(|tx| {
            let record = tx
                .query_row(
                    "SELECT host, port, username, password, timestamp
                     FROM credentials WHERE key = ?1",
                    params![key],
                    |row| {
                        Ok(CredentialRecord {
                            host: row.get(0)?,
                            port: row.get(1)?,
                            username: row.get(2)?,
                            password: row.get(3)?,
                            timestamp: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        });
        result.unwrap_or_else(|e| {
            error!("Error getting client state for {}: {}", key, e);
            None
        })
    }

    /// Delete the record under `key`. Returns `false` when nothing was stored.
    pub fn remove(&self, key: &str) -> bool {
        let result = self.with_transaction(|tx| {
            let removed = tx.execute("DELETE FROM credentials WHERE key = ?1", params![key])?;
            Ok(removed > 0)
        });
        result.unwrap_or_else(|e| {
            error!("Error removing client state for {}: {}", key, e);
            false
        })
    }

    /// Delete every record older than `max_age_secs`, returning how many were removed.
    pub fn sweep_expired(&self, max_age_secs: u64) -> usize {
        self.sweep_expired_at(now_secs(), max_age_secs)
    }

    pub(crate) fn sweep_expired_at(&self, now: f64, max_age_secs: u64) -> usize {
        let result = self.with_transaction(|tx| {
            let removed = tx.execute(
                "DELETE FROM credentials WHERE ?1 - timestamp > ?2",
                params![now, max_age_secs as f64],
            )?;
            Ok(removed)
        });
        result.unwrap_or_else(|e| {
            error!("Error clearing expired clients: {}", e);
            0
        })
    }

    /// Whether a record exists under `key`.
    pub fn has(&self, key: &str) -> bool {
        let result = self.with_transaction(|tx| {
            let found = tx
                .query_row(
                    "SELECT 1 FROM credentials WHERE key = ?1",
                    params![key],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        });
        result.unwrap_or_else(|e| {
            error!("Error checking client existence for {}: {}", key, e);
            false
        })
    }

    pub(crate) fn put(&self, key: &str, record: &CredentialRecord) -> StoreResult<()> {
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO credentials (key, host, port, username, password, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(key) DO UPDATE SET
                    host = excluded.host,
                    port = excluded.port,
                    username = excluded.username,
                    password = excluded.password,
                    timestamp = excluded.timestamp",
                params![
                    key,
                    record.host,
                    record.port,
                    record.username,
                    record.password,
                    record.timestamp
                ],
            )?;
            Ok(())
        })
    }

    fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(host: &str, timestamp: f64) -> CredentialRecord {
        CredentialRecord {
            host: host.to_string(),
            port: 22,
            username: "alice".to_string(),
            password: "secret".to_string(),
            timestamp,
        }
    }

    #[test]
    fn save_then_get_returns_saved_fields() {
        let store = CredentialStore::open_in_memory().unwrap();
        assert!(store.save("10.0.0.5:2222alice", "10.0.0.5", 2222, "alice", "pw"));

        let found = store.get("10.0.0.5:2222alice").unwrap();
        assert_eq!(found.host, "10.0.0.5");
        assert_eq!(found.port, 2222);
        assert_eq!(found.username, "alice");
        assert_eq!(found.password, "pw");
        assert!(found.timestamp > 0.0);
        assert!(store.has("10.0.0.5:2222alice"));
    }

    #[test]
    fn save_overwrites_and_refreshes_timestamp() {
        let store = CredentialStore::open_in_memory().unwrap();
        store.put("k", &record("old-host", 10.0)).unwrap();

        assert!(store.save("k", "new-host", 2200, "bob", "pw2"));
        let found = store.get("k").unwrap();
        assert_eq!(found.host, "new-host");
        assert_eq!(found.port, 2200);
        assert_eq!(found.username, "bob");
        assert!(found.timestamp > 10.0);
    }

    #[test]
    fn remove_then_get_is_not_found() {
        let store = CredentialStore::open_in_memory().unwrap();
        store.save("k", "h", 22, "u", "p");

        assert!(store.remove("k"));
        assert!(store.get("k").is_none());
        assert!(!store.has("k"));
        assert!(!store.remove("k"));
    }

    #[test]
    fn sweep_removes_exactly_the_expired_records() {
        let store = CredentialStore::open_in_memory().unwrap();
        let now = 10_000.0;
        store.put("fresh", &record("a", now - 100.0)).unwrap();
        store.put("boundary", &record("b", now - 3600.0)).unwrap();
        store.put("stale", &record("c", now - 3601.0)).unwrap();
        store.put("ancient", &record("d", 0.0)).unwrap();

        assert_eq!(store.sweep_expired_at(now, 3600), 2);
        assert!(store.has("fresh"));
        assert!(store.has("boundary"));
        assert!(!store.has("stale"));
        assert!(!store.has("ancient"));
        assert_eq!(store.get("fresh").unwrap(), record("a", now - 100.0));
    }

    #[test]
    fn sweep_of_empty_store_removes_nothing() {
        let store = CredentialStore::open_in_memory().unwrap();
        assert_eq!(store.sweep_expired(3600), 0);
    }

    #[test]
    fn records_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("client_db.sqlite3");
        {
            let store = CredentialStore::open(&path).unwrap();
            assert!(store.save("k", "h", 22, "u", "p"));
        }
        let reopened = CredentialStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().host, "h");
    }

    #[test]
    fn concurrent_saves_on_distinct_keys_do_not_interfere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_db.sqlite3");
        CredentialStore::open(&path).unwrap();

        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let path = path.clone();
                std::thread::spawn(move || {
                    // A separate connection per writer stands in for a separate process
                    let store = CredentialStore::open(&path).unwrap();
                    for i in 0..25 {
                        let key = format!("host{writer}:22user{i}");
                        assert!(store.save(&key, &format!("host{writer}"), 22, &format!("user{i}"), &format!("pw{writer}-{i}")));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let store = CredentialStore::open(&path).unwrap();
        for writer in 0..8 {
            for i in 0..25 {
                let found = store.get(&format!("host{writer}:22user{i}")).unwrap();
                assert_eq!(found.host, format!("host{writer}"));
                assert_eq!(found.username, format!("user{i}"));
                assert_eq!(found.password, format!("pw{writer}-{i}"));
            }
        }
    }
}
