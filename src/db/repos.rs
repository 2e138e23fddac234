//! Item store: cached repositories per query scope.
//!
//! All functions take a plain connection so the mediator can call them from
//! inside its own transaction.

use rusqlite::{params, Connection, Row};

use super::QueryScope;
use crate::error::StoreError;
use crate::github::types::Repo;

const COLUMNS: &str = "id, name, full_name, description, url, stars, forks, language";

/// Insert or replace repositories by id.
pub fn insert_all(conn: &Connection, scope: &QueryScope, repos: &[Repo]) -> Result<(), StoreError> {
  let mut stmt = conn.prepare_cached(
    "INSERT OR REPLACE INTO repos
       (query_hash, id, name, full_name, description, url, stars, forks, language)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
  )?;

  for repo in repos {
    stmt.execute(params![
      scope.as_str(),
      repo.id,
      repo.name,
      repo.full_name,
      repo.description,
      repo.url,
      repo.stars,
      repo.forks,
      repo.language,
    ])?;
  }

  Ok(())
}

/// Delete every repository of the scope.
pub fn clear(conn: &Connection, scope: &QueryScope) -> Result<usize, StoreError> {
  let deleted = conn.execute(
    "DELETE FROM repos WHERE query_hash = ?1",
    params![scope.as_str()],
  )?;
  Ok(deleted)
}

/// Delete repositories cached for any other query.
pub fn clear_other_scopes(conn: &Connection, scope: &QueryScope) -> Result<usize, StoreError> {
  let deleted = conn.execute(
    "DELETE FROM repos WHERE query_hash <> ?1",
    params![scope.as_str()],
  )?;
  Ok(deleted)
}

/// A slice of the sorted result list.
pub fn page(
  conn: &Connection,
  scope: &QueryScope,
  offset: usize,
  limit: usize,
) -> Result<Vec<Repo>, StoreError> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {} FROM repos WHERE query_hash = ?1
     ORDER BY stars DESC, id ASC
     LIMIT ?2 OFFSET ?3",
    COLUMNS
  ))?;

  let repos = stmt
    .query_map(
      params![scope.as_str(), limit as i64, offset as i64],
      from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(repos)
}

/// The whole sorted result list.
pub fn all(conn: &Connection, scope: &QueryScope) -> Result<Vec<Repo>, StoreError> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {} FROM repos WHERE query_hash = ?1 ORDER BY stars DESC, id ASC",
    COLUMNS
  ))?;

  let repos = stmt
    .query_map(params![scope.as_str()], from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(repos)
}

pub fn count(conn: &Connection, scope: &QueryScope) -> Result<usize, StoreError> {
  let count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM repos WHERE query_hash = ?1",
    params![scope.as_str()],
    |row| row.get(0),
  )?;
  Ok(count as usize)
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Repo> {
  Ok(Repo {
    id: row.get(0)?,
    name: row.get(1)?,
    full_name: row.get(2)?,
    description: row.get(3)?,
    url: row.get(4)?,
    stars: row.get(5)?,
    forks: row.get(6)?,
    language: row.get(7)?,
  })
}
