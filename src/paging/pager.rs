//! Windowed read path over the cached repositories.
//!
//! The pager serves pages straight from the cache while it has rows past the
//! window, and only asks the mediator to fetch when a read runs off the end
//! of what is cached. It holds its window lock for the whole of a load, so
//! at most one mediator call is in flight.

use chrono::Duration;
use futures::Stream;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::cancel::CancelToken;
use super::mediator::{InitializeAction, RemoteMediator};
use super::source::RepoSource;
use super::state::{LoadType, LoadedPage, PagingConfig, PagingState};
use super::SearchSession;
use crate::db::{repos, Database};
use crate::error::{LoadError, StoreError};
use crate::github::types::Repo;

/// Edge of the window a read approached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
  Top,
  Bottom,
}

/// How a window request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowLoad {
  /// Served from rows already cached
  Local,
  /// A remote load ran and the window was re-read
  Remote { end_of_pagination_reached: bool },
  /// Nothing more in this direction
  Exhausted,
}

/// What the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSnapshot {
  pub query: String,
  /// Absolute index of `items[0]`
  pub offset: usize,
  pub items: Vec<Repo>,
  pub prepend_end: bool,
  pub append_end: bool,
}

#[derive(Debug, Default)]
struct Window {
  pages: Vec<LoadedPage>,
  prepend_end: bool,
  append_end: bool,
}

impl Window {
  fn start_offset(&self) -> usize {
    self.pages.first().map_or(0, |page| page.offset)
  }

  fn end_offset(&self) -> usize {
    self
      .pages
      .last()
      .map_or(0, |page| page.offset + page.data.len())
  }

  fn item_count(&self) -> usize {
    self.pages.iter().map(|page| page.data.len()).sum()
  }
}

pub struct Pager<S> {
  mediator: RemoteMediator<S>,
  db: Arc<Database>,
  config: PagingConfig,
  session: Mutex<SearchSession>,
  anchor: Mutex<Option<usize>>,
  window: tokio::sync::Mutex<Window>,
}

impl<S: RepoSource> Pager<S> {
  pub fn new(
    source: Arc<S>,
    db: Arc<Database>,
    config: PagingConfig,
    cache_timeout: Duration,
    query: &str,
  ) -> Self {
    let mediator = RemoteMediator::new(source, Arc::clone(&db)).with_cache_timeout(cache_timeout);
    Self {
      mediator,
      db,
      config,
      session: Mutex::new(SearchSession::new(query)),
      anchor: Mutex::new(None),
      window: tokio::sync::Mutex::new(Window::default()),
    }
  }

  pub fn session(&self) -> SearchSession {
    self
      .session
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .clone()
  }

  /// Record the absolute index of the item last viewed.
  pub fn set_anchor(&self, position: usize) {
    *self.anchor.lock().unwrap_or_else(|e| e.into_inner()) = Some(position);
  }

  fn anchor(&self) -> Option<usize> {
    *self.anchor.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn page_size(&self) -> usize {
    self.config.page_size as usize
  }

  /// Show the cache for the current query, refreshing first when it is
  /// missing or older than the cache timeout.
  pub async fn start(&self, cancel: &CancelToken) -> Result<WindowLoad, LoadError> {
    let mut window = self.window.lock().await;
    let session = self.session();

    match self.mediator.initialize(&session)? {
      InitializeAction::SkipInitialRefresh => {
        debug!(query = session.query(), "serving cached results");
        self.reload(&mut window, &session, 0, self.page_size())?;
        Ok(WindowLoad::Local)
      }
      InitializeAction::LaunchInitialRefresh => {
        self.refresh_locked(&mut window, &session, cancel).await
      }
    }
  }

  /// Switch to a new query. Returns `None` if `query` is already current.
  pub async fn search(
    &self,
    query: &str,
    cancel: &CancelToken,
  ) -> Result<Option<WindowLoad>, LoadError> {
    let mut window = self.window.lock().await;
    // A search replaced before it got the lock must not switch the session
    if cancel.is_cancelled() {
      return Err(LoadError::Cancelled);
    }
    if self.session().matches(query) && !window.pages.is_empty() {
      return Ok(None);
    }

    let session = SearchSession::new(query);
    *self.session.lock().unwrap_or_else(|e| e.into_inner()) = session.clone();
    *self.anchor.lock().unwrap_or_else(|e| e.into_inner()) = None;
    *window = Window::default();
    debug!(query = session.query(), "new search session");

    self
      .refresh_locked(&mut window, &session, cancel)
      .await
      .map(Some)
  }

  /// Reload the current query around the anchor.
  pub async fn refresh(&self, cancel: &CancelToken) -> Result<WindowLoad, LoadError> {
    let mut window = self.window.lock().await;
    let session = self.session();
    self.refresh_locked(&mut window, &session, cancel).await
  }

  async fn refresh_locked(
    &self,
    window: &mut Window,
    session: &SearchSession,
    cancel: &CancelToken,
  ) -> Result<WindowLoad, LoadError> {
    let state = self.paging_state(window);
    let outcome = self
      .mediator
      .load(session, LoadType::Refresh, &state, cancel)
      .await?;
    let end = outcome.end_of_pagination_reached;

    // The refresh commit replaced the cache, so the window restarts at the top
    *self.anchor.lock().unwrap_or_else(|e| e.into_inner()) = None;
    self.reload(window, session, 0, self.page_size())?;
    // The refresh may have resumed past page 1, so only the mediator can
    // tell whether anything lies above the new first item
    window.prepend_end = false;
    window.append_end = end;

    Ok(WindowLoad::Remote {
      end_of_pagination_reached: end,
    })
  }

  /// Extend the window at `edge`, fetching only if the cache has no more rows.
  pub async fn request_window(
    &self,
    edge: Edge,
    cancel: &CancelToken,
  ) -> Result<WindowLoad, LoadError> {
    let mut window = self.window.lock().await;
    let session = self.session();
    let page_size = self.page_size();

    match edge {
      Edge::Bottom => {
        let end = window.end_offset();
        let local = self
          .db
          .read(|conn| repos::page(conn, session.scope(), end, page_size))?;
        if !local.is_empty() {
          window.pages.push(LoadedPage {
            offset: end,
            data: local,
          });
          self.trim(&mut window, edge);
          return Ok(WindowLoad::Local);
        }
        if window.append_end {
          return Ok(WindowLoad::Exhausted);
        }

        let state = self.paging_state(&window);
        let outcome = self
          .mediator
          .load(&session, LoadType::Append, &state, cancel)
          .await?;
        if outcome.end_of_pagination_reached {
          window.append_end = true;
        }

        // New rows can sort anywhere, so re-read the window plus one page
        let start = window.start_offset();
        let len = window.item_count() + page_size;
        self.reload(&mut window, &session, start, len)?;
        self.trim(&mut window, edge);

        Ok(WindowLoad::Remote {
          end_of_pagination_reached: outcome.end_of_pagination_reached,
        })
      }
      Edge::Top => {
        let start = window.start_offset();
        if start > 0 {
          let from = start.saturating_sub(page_size);
          let local = self
            .db
            .read(|conn| repos::page(conn, session.scope(), from, start - from))?;
          window.pages.insert(
            0,
            LoadedPage {
              offset: from,
              data: local,
            },
          );
          self.trim(&mut window, edge);
          return Ok(WindowLoad::Local);
        }
        if window.prepend_end {
          return Ok(WindowLoad::Exhausted);
        }

        let state = self.paging_state(&window);
        let outcome = self
          .mediator
          .load(&session, LoadType::Prepend, &state, cancel)
          .await?;
        if outcome.end_of_pagination_reached {
          window.prepend_end = true;
        }

        let len = window.item_count() + page_size;
        self.reload(&mut window, &session, 0, len)?;
        self.trim(&mut window, edge);

        Ok(WindowLoad::Remote {
          end_of_pagination_reached: outcome.end_of_pagination_reached,
        })
      }
    }
  }

  /// Current window contents.
  pub async fn snapshot(&self) -> WindowSnapshot {
    let window = self.window.lock().await;
    WindowSnapshot {
      query: self.session().query().to_string(),
      offset: window.start_offset(),
      items: window
        .pages
        .iter()
        .flat_map(|page| page.data.iter().cloned())
        .collect(),
      prepend_end: window.prepend_end,
      append_end: window.append_end,
    }
  }

  /// Every cached item of the current query, in display order.
  ///
  /// Yields the current list on first poll and again after every commit.
  /// The stream stays on the query current when it was created; call again
  /// after a search to follow the new one.
  pub fn observe_items(&self) -> impl Stream<Item = Result<Vec<Repo>, StoreError>> + Send + 'static {
    let scope = self.session().scope().clone();
    let db = Arc::clone(&self.db);
    let rx = db.subscribe();

    futures::stream::unfold((db, rx, scope, true), |(db, mut rx, scope, first)| async move {
      if !first && rx.changed().await.is_err() {
        return None;
      }
      rx.borrow_and_update();
      let items = db.read(|conn| repos::all(conn, &scope));
      Some((items, (db, rx, scope, false)))
    })
  }

  fn paging_state(&self, window: &Window) -> PagingState {
    PagingState::new(window.pages.clone(), self.anchor(), self.config)
  }

  fn reload(
    &self,
    window: &mut Window,
    session: &SearchSession,
    start: usize,
    len: usize,
  ) -> Result<(), StoreError> {
    let page_size = self.page_size();
    let rows = self
      .db
      .read(|conn| repos::page(conn, session.scope(), start, len))?;

    window.pages = rows
      .chunks(page_size)
      .enumerate()
      .map(|(i, chunk)| LoadedPage {
        offset: start + i * page_size,
        data: chunk.to_vec(),
      })
      .collect();
    Ok(())
  }

  /// Drop pages at the edge opposite `grew_at` until the window fits.
  fn trim(&self, window: &mut Window, grew_at: Edge) {
    let max_size = self.config.max_size as usize;
    while window.item_count() > max_size && window.pages.len() > 1 {
      match grew_at {
        Edge::Bottom => {
          window.pages.remove(0);
        }
        Edge::Top => {
          window.pages.pop();
        }
      }
    }
  }
}
