//! Remote mediator: turns a load at an edge of the cached data into a page
//! fetch, and commits the fetched page atomically.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cancel::CancelToken;
use super::source::RepoSource;
use super::state::{LoadRequest, LoadType, PagingState};
use super::SearchSession;
use crate::db::remote_keys::{self, RemoteKeys};
use crate::db::{repos, Database};
use crate::error::{LoadError, StoreError};
use crate::github::types::Repo;

/// Page index of the first remote page
pub const STARTING_PAGE_INDEX: u32 = 1;

/// Successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediatorSuccess {
  /// No more data in the loaded direction
  pub end_of_pagination_reached: bool,
}

impl MediatorSuccess {
  fn new(end_of_pagination_reached: bool) -> Self {
    Self {
      end_of_pagination_reached,
    }
  }
}

/// Whether cached data is fresh enough to show without a startup refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializeAction {
  LaunchInitialRefresh,
  SkipInitialRefresh,
}

enum PageDecision {
  Fetch(u32),
  Done(MediatorSuccess),
}

pub struct RemoteMediator<S> {
  source: Arc<S>,
  db: Arc<Database>,
  cache_timeout: Duration,
}

impl<S: RepoSource> RemoteMediator<S> {
  pub fn new(source: Arc<S>, db: Arc<Database>) -> Self {
    Self {
      source,
      db,
      cache_timeout: Duration::hours(1),
    }
  }

  /// Set how long cached results count as fresh for [`Self::initialize`].
  pub fn with_cache_timeout(mut self, cache_timeout: Duration) -> Self {
    self.cache_timeout = cache_timeout;
    self
  }

  /// Decide whether a startup refresh is needed for `session`.
  pub fn initialize(&self, session: &SearchSession) -> Result<InitializeAction, StoreError> {
    let oldest = self
      .db
      .read(|conn| remote_keys::oldest_created_at(conn, session.scope()))?;

    let action = match oldest {
      Some(created_at) if Utc::now() - created_at < self.cache_timeout => {
        InitializeAction::SkipInitialRefresh
      }
      _ => InitializeAction::LaunchInitialRefresh,
    };
    debug!(query = session.query(), ?action, "initialized mediator");

    Ok(action)
  }

  /// Load one page for `load_type` at the edge described by `state`.
  ///
  /// Nothing is written unless the fetch succeeds and the whole commit
  /// succeeds. Cancelling `cancel` before the fetch resolves returns
  /// [`LoadError::Cancelled`].
  pub async fn load(
    &self,
    session: &SearchSession,
    load_type: LoadType,
    state: &PagingState,
    cancel: &CancelToken,
  ) -> Result<MediatorSuccess, LoadError> {
    let request = LoadRequest::resolve(load_type, state);

    let page = match self.resolve_page(session, request)? {
      PageDecision::Fetch(page) => page,
      PageDecision::Done(success) => {
        debug!(?request, ?success, "no fetch needed");
        return Ok(success);
      }
    };

    if cancel.is_cancelled() {
      return Err(LoadError::Cancelled);
    }

    debug!(?load_type, page, query = session.query(), "fetching page");
    let fetched = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        debug!(?load_type, page, "load cancelled during fetch");
        return Err(LoadError::Cancelled);
      }
      result = self.source.search_repos(session.query(), page, state.config.page_size) => result,
    };

    let fetched = fetched.map_err(|e| {
      warn!(?load_type, page, error = %e, "fetch failed");
      LoadError::from(e)
    })?;

    if cancel.is_cancelled() {
      return Err(LoadError::Cancelled);
    }

    let end_of_pagination_reached = fetched.items.is_empty();
    let cached = self
      .commit(session, load_type, page, &fetched.items)
      .map_err(|e| {
        warn!(?load_type, page, error = %e, "commit failed");
        LoadError::from(e)
      })?;

    info!(
      ?load_type,
      page,
      items = fetched.items.len(),
      total = fetched.total_count,
      cached,
      end_of_pagination_reached,
      "committed page"
    );

    Ok(MediatorSuccess::new(end_of_pagination_reached))
  }

  fn resolve_page(
    &self,
    session: &SearchSession,
    request: LoadRequest,
  ) -> Result<PageDecision, StoreError> {
    let decision = match request {
      LoadRequest::Append { last_item } => {
        // No keys means the refresh result is not in the database yet;
        // the read path will ask again once it lands.
        let keys = self.remote_keys_for(session, last_item)?;
        match keys.as_ref().and_then(|k| k.next_key) {
          Some(next_key) => PageDecision::Fetch(next_key),
          None => PageDecision::Done(MediatorSuccess::new(keys.is_some())),
        }
      }
      LoadRequest::Prepend { first_item } => {
        let keys = self.remote_keys_for(session, first_item)?;
        match keys.as_ref().and_then(|k| k.prev_key) {
          Some(prev_key) => PageDecision::Fetch(prev_key),
          None => PageDecision::Done(MediatorSuccess::new(keys.is_some())),
        }
      }
      LoadRequest::Refresh { anchor_item } => {
        // Resume one page before the anchor's next page so the refreshed
        // window lands around the anchor.
        let page = self
          .remote_keys_for(session, anchor_item)?
          .and_then(|k| k.next_key)
          .map(|next_key| next_key.saturating_sub(1).max(STARTING_PAGE_INDEX))
          .unwrap_or(STARTING_PAGE_INDEX);
        PageDecision::Fetch(page)
      }
    };

    Ok(decision)
  }

  fn remote_keys_for(
    &self,
    session: &SearchSession,
    repo_id: Option<i64>,
  ) -> Result<Option<RemoteKeys>, StoreError> {
    match repo_id {
      Some(id) => self
        .db
        .read(|conn| remote_keys::remote_keys_repo_id(conn, session.scope(), id)),
      None => Ok(None),
    }
  }

  fn commit(
    &self,
    session: &SearchSession,
    load_type: LoadType,
    page: u32,
    items: &[Repo],
  ) -> Result<usize, StoreError> {
    let scope = session.scope();
    let end_of_pagination_reached = items.is_empty();
    let prev_key = (page != STARTING_PAGE_INDEX).then(|| page - 1);
    let next_key = (!end_of_pagination_reached).then(|| page + 1);
    let created_at = Utc::now();

    let keys: Vec<RemoteKeys> = items
      .iter()
      .map(|repo| RemoteKeys {
        repo_id: repo.id,
        prev_key,
        next_key,
        created_at,
      })
      .collect();

    self.db.with_transaction(|tx| {
      if load_type == LoadType::Refresh {
        remote_keys::clear(tx, scope)?;
        repos::clear(tx, scope)?;
        remote_keys::clear_other_scopes(tx, scope)?;
        repos::clear_other_scopes(tx, scope)?;
      }

      remote_keys::insert_all(tx, scope, &keys)?;
      repos::insert_all(tx, scope, items)?;

      if end_of_pagination_reached {
        match load_type {
          LoadType::Append => {
            remote_keys::seal_next(tx, scope, page)?;
          }
          LoadType::Prepend => {
            remote_keys::seal_prev(tx, scope, page)?;
          }
          LoadType::Refresh => {}
        }
      }

      repos::count(tx, scope)
    })
  }
}
