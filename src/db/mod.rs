pub mod remote_keys;
pub mod repos;
pub mod schema;

use rusqlite::{Connection, Transaction};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::error::StoreError;

/// Partition key for every cached row: one scope per search query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryScope(String);

impl QueryScope {
  /// Derive the scope for a user query.
  ///
  /// Whitespace and case differences map to the same scope.
  pub fn for_query(query: &str) -> Self {
    let normalized = query.trim().to_lowercase();

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    Self(hex::encode(hasher.finalize()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

/// Database connection wrapper for the paging cache.
///
/// The connection is guarded by a mutex, so a reader observes the state
/// before or after a transaction and never a partial one.
pub struct Database {
  conn: Mutex<Connection>,
  /// Bumped after every successful commit
  generation: watch::Sender<u64>,
}

impl Database {
  /// Open or create the database at `path`, or at the default location
  pub fn open(path: Option<&Path>) -> Result<Self, StoreError> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| StoreError::CacheDir {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    debug!(path = %path.display(), "opening cache database");
    Self::from_connection(Connection::open(&path)?)
  }

  /// Open a private in-memory database
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, StoreError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self, StoreError> {
    conn.execute_batch(schema::SCHEMA)?;
    let (generation, _) = watch::channel(0);

    Ok(Self {
      conn: Mutex::new(conn),
      generation,
    })
  }

  /// Get the default database path
  pub fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(StoreError::NoDataDir)?;

    Ok(data_dir.join("ghscroll").join("cache.db"))
  }

  /// Run read-only work against the connection.
  pub fn read<T>(
    &self,
    f: impl FnOnce(&Connection) -> Result<T, StoreError>,
  ) -> Result<T, StoreError> {
    let conn = self.conn.lock()?;
    f(&conn)
  }

  /// Run `f` inside one transaction.
  ///
  /// The transaction commits only if `f` returns `Ok`; on error it is rolled
  /// back when dropped. Subscribers are notified after the commit.
  pub fn with_transaction<T>(
    &self,
    f: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
  ) -> Result<T, StoreError> {
    let mut conn = self.conn.lock()?;
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    drop(conn);

    self.generation.send_modify(|g| *g += 1);
    Ok(value)
  }

  /// Receiver that changes after every committed transaction
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.generation.subscribe()
  }

  #[cfg(test)]
  pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
    self.conn.lock()?.execute_batch(sql)?;
    Ok(())
  }
}
