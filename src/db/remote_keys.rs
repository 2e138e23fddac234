//! Key store: page tokens recorded next to each cached repository.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::QueryScope;
use crate::error::StoreError;

/// Page tokens around one cached repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteKeys {
  pub repo_id: i64,
  /// Page before the one this repo came from, `None` on the first page
  pub prev_key: Option<u32>,
  /// Page after the one this repo came from, `None` once exhausted
  pub next_key: Option<u32>,
  pub created_at: DateTime<Utc>,
}

/// Keys for one repository, if it is currently cached.
pub fn remote_keys_repo_id(
  conn: &Connection,
  scope: &QueryScope,
  repo_id: i64,
) -> Result<Option<RemoteKeys>, StoreError> {
  let keys = conn
    .query_row(
      "SELECT repo_id, prev_key, next_key, created_at FROM remote_keys
       WHERE query_hash = ?1 AND repo_id = ?2",
      params![scope.as_str(), repo_id],
      from_row,
    )
    .optional()?;
  Ok(keys)
}

/// Insert or replace keys by repo id.
pub fn insert_all(
  conn: &Connection,
  scope: &QueryScope,
  keys: &[RemoteKeys],
) -> Result<(), StoreError> {
  let mut stmt = conn.prepare_cached(
    "INSERT OR REPLACE INTO remote_keys (query_hash, repo_id, prev_key, next_key, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;

  for key in keys {
    stmt.execute(params![
      scope.as_str(),
      key.repo_id,
      key.prev_key,
      key.next_key,
      key.created_at.timestamp_millis(),
    ])?;
  }

  Ok(())
}

pub fn clear(conn: &Connection, scope: &QueryScope) -> Result<usize, StoreError> {
  let deleted = conn.execute(
    "DELETE FROM remote_keys WHERE query_hash = ?1",
    params![scope.as_str()],
  )?;
  Ok(deleted)
}

pub fn clear_other_scopes(conn: &Connection, scope: &QueryScope) -> Result<usize, StoreError> {
  let deleted = conn.execute(
    "DELETE FROM remote_keys WHERE query_hash <> ?1",
    params![scope.as_str()],
  )?;
  Ok(deleted)
}

/// Mark `page` as exhausted going forward: keys pointing at it lose their
/// next token.
pub fn seal_next(conn: &Connection, scope: &QueryScope, page: u32) -> Result<usize, StoreError> {
  let updated = conn.execute(
    "UPDATE remote_keys SET next_key = NULL WHERE query_hash = ?1 AND next_key = ?2",
    params![scope.as_str(), page],
  )?;
  Ok(updated)
}

/// Mark `page` as exhausted going backward.
pub fn seal_prev(conn: &Connection, scope: &QueryScope, page: u32) -> Result<usize, StoreError> {
  let updated = conn.execute(
    "UPDATE remote_keys SET prev_key = NULL WHERE query_hash = ?1 AND prev_key = ?2",
    params![scope.as_str(), page],
  )?;
  Ok(updated)
}

/// When the oldest key of the scope was written, `None` if nothing is cached.
pub fn oldest_created_at(
  conn: &Connection,
  scope: &QueryScope,
) -> Result<Option<DateTime<Utc>>, StoreError> {
  let millis: Option<i64> = conn.query_row(
    "SELECT MIN(created_at) FROM remote_keys WHERE query_hash = ?1",
    params![scope.as_str()],
    |row| row.get(0),
  )?;
  Ok(millis.map(from_millis))
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<RemoteKeys> {
  Ok(RemoteKeys {
    repo_id: row.get(0)?,
    prev_key: row.get(1)?,
    next_key: row.get(2)?,
    created_at: from_millis(row.get(3)?),
  })
}

fn from_millis(millis: i64) -> DateTime<Utc> {
  Utc
    .timestamp_millis_opt(millis)
    .single()
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::Database;
  use chrono::Duration;

  fn keys(repo_id: i64, prev_key: Option<u32>, next_key: Option<u32>) -> RemoteKeys {
    RemoteKeys {
      repo_id,
      prev_key,
      next_key,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn test_lookup_missing_is_none() {
    let db = Database::open_in_memory().unwrap();
    let scope = QueryScope::for_query("android");

    let found = db
      .read(|conn| remote_keys_repo_id(conn, &scope, 42))
      .unwrap();
    assert!(found.is_none());
  }

  #[test]
  fn test_insert_and_lookup() {
    let db = Database::open_in_memory().unwrap();
    let scope = QueryScope::for_query("android");

    db.with_transaction(|tx| insert_all(tx, &scope, &[keys(1, None, Some(2)), keys(2, Some(1), Some(3))]))
      .unwrap();

    let first = db
      .read(|conn| remote_keys_repo_id(conn, &scope, 1))
      .unwrap()
      .unwrap();
    assert_eq!(first.prev_key, None);
    assert_eq!(first.next_key, Some(2));

    let other_scope = QueryScope::for_query("kotlin");
    let missing = db
      .read(|conn| remote_keys_repo_id(conn, &other_scope, 1))
      .unwrap();
    assert!(missing.is_none());
  }

  #[test]
  fn test_seal_only_touches_matching_page() {
    let db = Database::open_in_memory().unwrap();
    let scope = QueryScope::for_query("android");

    db.with_transaction(|tx| {
      insert_all(
        tx,
        &scope,
        &[keys(1, None, Some(2)), keys(3, Some(2), Some(4)), keys(4, Some(2), Some(4))],
      )
    })
    .unwrap();

    let sealed = db.with_transaction(|tx| seal_next(tx, &scope, 4)).unwrap();
    assert_eq!(sealed, 2);

    let first = db
      .read(|conn| remote_keys_repo_id(conn, &scope, 1))
      .unwrap()
      .unwrap();
    assert_eq!(first.next_key, Some(2));
    let last = db
      .read(|conn| remote_keys_repo_id(conn, &scope, 4))
      .unwrap()
      .unwrap();
    assert_eq!(last.next_key, None);
    assert_eq!(last.prev_key, Some(2));

    db.with_transaction(|tx| seal_prev(tx, &scope, 2)).unwrap();
    let last = db
      .read(|conn| remote_keys_repo_id(conn, &scope, 4))
      .unwrap()
      .unwrap();
    assert_eq!(last.prev_key, None);
  }

  #[test]
  fn test_oldest_created_at() {
    let db = Database::open_in_memory().unwrap();
    let scope = QueryScope::for_query("android");
    assert!(db
      .read(|conn| oldest_created_at(conn, &scope))
      .unwrap()
      .is_none());

    let old = Utc::now() - Duration::hours(3);
    let mut stale = keys(1, None, Some(2));
    stale.created_at = old;
    db.with_transaction(|tx| insert_all(tx, &scope, &[stale, keys(2, None, Some(2))]))
      .unwrap();

    let oldest = db
      .read(|conn| oldest_created_at(conn, &scope))
      .unwrap()
      .unwrap();
    assert_eq!(oldest.timestamp_millis(), old.timestamp_millis());
  }
}
