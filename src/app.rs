use crate::config::Config;
use crate::db::Database;
use crate::error::LoadError;
use crate::event::{Event, EventHandler, PagingEvent, PagingJob};
use crate::github::client::GithubClient;
use crate::github::types::Repo;
use crate::paging::{
  cancel_pair, CancelHandle, CancelToken, Edge, Pager, PagingConfig, WindowLoad, WindowSnapshot,
};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use futures::StreamExt;
use ratatui::prelude::*;
use std::collections::HashSet;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Search,
}

/// What the footer reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
  Idle,
  Loading(PagingJob),
  Failed {
    job: PagingJob,
    message: String,
    retryable: bool,
  },
  EndOfResults,
  Message(String),
}

/// Main application state
pub struct App {
  pager: Arc<Pager<GithubClient>>,
  paging: PagingConfig,
  api_host: String,

  /// Last window received from the pager
  window: WindowSnapshot,
  /// Selected index within `window.items`
  selected: usize,

  mode: Mode,
  search_input: String,
  status: Status,
  cached_count: usize,

  /// Jobs of the current generation not yet reported back
  in_flight: HashSet<PagingJob>,
  /// Bumped by every search; reports from older generations are dropped
  generation: u64,
  /// Query of the search that has not loaded yet
  pending_query: Option<String>,
  cancel: CancelHandle,
  cancel_token: CancelToken,
  observer: Option<JoinHandle<()>>,

  events: EventHandler,

  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, query: &str) -> Result<Self> {
    let client = GithubClient::new(config)?;
    let api_host = client.host().to_string();
    let db = Database::open(config.cache.path.as_deref())?;
    let paging = PagingConfig::from(&config.paging);

    let pager = Pager::new(
      Arc::new(client),
      Arc::new(db),
      paging,
      chrono::Duration::minutes(config.cache.timeout_minutes),
      query,
    );

    let (cancel, cancel_token) = cancel_pair();

    Ok(Self {
      pager: Arc::new(pager),
      paging,
      api_host,
      window: WindowSnapshot {
        query: query.trim().to_string(),
        ..WindowSnapshot::default()
      },
      selected: 0,
      mode: Mode::Normal,
      search_input: String::new(),
      status: Status::Idle,
      cached_count: 0,
      in_flight: HashSet::new(),
      generation: 0,
      pending_query: None,
      cancel,
      cancel_token,
      observer: None,
      events: EventHandler::new(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    self.events.start_input(Duration::from_millis(250));

    self.watch_cache();
    self.spawn_job(PagingJob::Start);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = self.events.next().await {
        self.handle_event(event);
      }
    }

    self.cancel.cancel();
    if let Some(observer) = self.observer.take() {
      observer.abort();
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {} // UI refresh happens automatically
      Event::Paging { generation, event } => {
        if generation == self.generation {
          self.handle_paging_event(event);
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Search => self.handle_search_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    let page = self.paging.page_size as isize;

    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::PageUp => self.move_selection(-page),
      KeyCode::PageDown => self.move_selection(page),
      KeyCode::Enter => {
        if let Some(repo) = self.selected_repo() {
          self.status = Status::Message(repo.url.clone());
        }
      }

      KeyCode::Char('r') => self.retry_or_refresh(),
      KeyCode::Char('/') => {
        self.mode = Mode::Search;
        self.search_input.clear();
      }

      _ => {}
    }
  }

  fn handle_search_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.search_input.clear();
      }
      KeyCode::Enter => {
        self.mode = Mode::Normal;
        let query = self.search_input.trim().to_string();
        if !query.is_empty() {
          self.start_search(query);
        }
      }
      KeyCode::Backspace => {
        self.search_input.pop();
      }
      KeyCode::Char(c) => {
        self.search_input.push(c);
      }
      _ => {}
    }
  }

  fn start_search(&mut self, query: String) {
    // Abandon loads for the previous query and forget their reports
    self.cancel.cancel();
    let (cancel, cancel_token) = cancel_pair();
    self.cancel = cancel;
    self.cancel_token = cancel_token;
    self.generation += 1;
    self.in_flight.clear();

    info!(%query, generation = self.generation, "searching");
    self.pending_query = Some(query);
    self.spawn_job(PagingJob::Search);
  }

  fn retry_or_refresh(&mut self) {
    match &self.status {
      Status::Failed {
        job,
        retryable: true,
        ..
      } => {
        let job = *job;
        self.spawn_job(job);
      }
      _ => self.spawn_job(PagingJob::Refresh),
    }
  }

  fn spawn_job(&mut self, job: PagingJob) {
    if !self.in_flight.insert(job) {
      return;
    }

    let pager = Arc::clone(&self.pager);
    let tx = self.events.sender();
    let cancel = self.cancel_token.clone();
    let generation = self.generation;
    let query = self
      .pending_query
      .clone()
      .unwrap_or_else(|| self.window.query.clone());

    tokio::spawn(async move {
      let _ = tx.send(Event::Paging {
        generation,
        event: PagingEvent::Loading(job),
      });

      let result = match job {
        PagingJob::Start => pager.start(&cancel).await.map(Some),
        PagingJob::Search => pager.search(&query, &cancel).await,
        PagingJob::Refresh => pager.refresh(&cancel).await.map(Some),
        PagingJob::Edge(edge) => pager.request_window(edge, &cancel).await.map(Some),
      };

      let event = match result {
        Ok(load) => PagingEvent::Loaded {
          job,
          load,
          snapshot: pager.snapshot().await,
        },
        Err(LoadError::Cancelled) => PagingEvent::Cancelled(job),
        Err(e) => {
          warn!(?job, error = %e, "paging job failed");
          PagingEvent::Failed {
            job,
            message: e.to_string(),
            retryable: e.is_retryable(),
          }
        }
      };
      let _ = tx.send(Event::Paging { generation, event });
    });
  }

  /// Forward cache changes for the current query to the event loop.
  fn watch_cache(&mut self) {
    if let Some(observer) = self.observer.take() {
      observer.abort();
    }

    let items = self.pager.observe_items();
    let tx = self.events.sender();
    let generation = self.generation;

    self.observer = Some(tokio::spawn(async move {
      let mut items = Box::pin(items);
      while let Some(result) = items.next().await {
        match result {
          Ok(items) => {
            let event = PagingEvent::CacheChanged(items.len());
            if tx.send(Event::Paging { generation, event }).is_err() {
              break;
            }
          }
          Err(e) => warn!(error = %e, "failed to read cache"),
        }
      }
    }));
  }

  fn handle_paging_event(&mut self, event: PagingEvent) {
    match event {
      PagingEvent::Loading(job) => self.status = Status::Loading(job),
      PagingEvent::Loaded {
        job,
        load,
        snapshot,
      } => {
        self.in_flight.remove(&job);
        self.apply_snapshot(job, snapshot);

        let bottom_reached = matches!(
          load,
          Some(WindowLoad::Exhausted)
            | Some(WindowLoad::Remote {
              end_of_pagination_reached: true
            })
        );
        self.status = match load {
          _ if bottom_reached && job == PagingJob::Edge(Edge::Bottom) => Status::EndOfResults,
          _ if self.window.items.is_empty() => Status::Message("No repositories found".into()),
          _ => Status::Idle,
        };

        if job == PagingJob::Search {
          self.pending_query = None;
          self.watch_cache();
        }
        if matches!(load, Some(WindowLoad::Local)) {
          self.maybe_prefetch();
        }
      }
      PagingEvent::Cancelled(job) => {
        self.in_flight.remove(&job);
        if self.status == Status::Loading(job) {
          self.status = Status::Idle;
        }
      }
      PagingEvent::Failed {
        job,
        message,
        retryable,
      } => {
        self.in_flight.remove(&job);
        self.status = Status::Failed {
          job,
          message,
          retryable,
        };
      }
      PagingEvent::CacheChanged(count) => self.cached_count = count,
    }
  }

  /// Replace the window, keeping the selection on the same absolute item.
  fn apply_snapshot(&mut self, job: PagingJob, snapshot: WindowSnapshot) {
    let absolute = match job {
      PagingJob::Edge(_) => self.window.offset + self.selected,
      PagingJob::Start | PagingJob::Search | PagingJob::Refresh => snapshot.offset,
    };

    self.window = snapshot;
    let last = self.window.items.len().saturating_sub(1);
    self.selected = absolute.saturating_sub(self.window.offset).min(last);
    self.pager.set_anchor(self.window.offset + self.selected);
  }

  fn move_selection(&mut self, delta: isize) {
    let len = self.window.items.len();
    if len == 0 {
      return;
    }

    let target = (self.selected as isize + delta).clamp(0, len as isize - 1);
    self.selected = target as usize;
    self.pager.set_anchor(self.window.offset + self.selected);
    self.maybe_prefetch();
  }

  /// Ask for more data when the selection gets close to a window edge.
  fn maybe_prefetch(&mut self) {
    let len = self.window.items.len();
    if len == 0 {
      return;
    }
    let distance = self.paging.prefetch_distance as usize;

    if self.selected + distance >= len - 1 && !self.window.append_end {
      self.spawn_job(PagingJob::Edge(Edge::Bottom));
    }
    if self.selected <= distance && (self.window.offset > 0 || !self.window.prepend_end) {
      self.spawn_job(PagingJob::Edge(Edge::Top));
    }
  }

  fn selected_repo(&self) -> Option<&Repo> {
    self.window.items.get(self.selected)
  }

  // Accessors for UI rendering
  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn search_input(&self) -> &str {
    &self.search_input
  }

  pub fn status(&self) -> &Status {
    &self.status
  }

  pub fn window(&self) -> &WindowSnapshot {
    &self.window
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn api_host(&self) -> &str {
    &self.api_host
  }

  pub fn cached_count(&self) -> usize {
    self.cached_count
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tempfile::TempDir;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn app(server: &MockServer, dir: &TempDir) -> App {
    let mut config = Config::default();
    config.github.api_url = server.uri();
    config.cache.path = Some(dir.path().join("cache.db"));
    App::new(&config, "android").unwrap()
  }

  fn page_json(names: &[&str]) -> serde_json::Value {
    let items: Vec<_> = names
      .iter()
      .enumerate()
      .map(|(i, name)| {
        json!({
          "id": i as i64 + 1,
          "name": name,
          "full_name": format!("owner/{}", name),
          "description": null,
          "html_url": format!("https://github.com/owner/{}", name),
          "stargazers_count": 100,
          "forks_count": 0,
          "language": null
        })
      })
      .collect();
    json!({ "total_count": items.len(), "incomplete_results": false, "items": items })
  }

  fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
  }

  /// Handle events until `done` holds
  async fn pump_until(app: &mut App, done: impl Fn(&App) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async move {
      while !done(app) {
        let event = app.events.next().await.unwrap();
        app.handle_event(event);
      }
    })
    .await
    .unwrap();
  }

  async fn queries(server: &MockServer) -> Vec<String> {
    server
      .received_requests()
      .await
      .unwrap_or_default()
      .iter()
      .filter_map(|request| {
        request
          .url
          .query_pairs()
          .find(|(name, _)| name == "q")
          .map(|(_, value)| value.into_owned())
      })
      .collect()
  }

  #[tokio::test]
  async fn test_start_before_run_reports_loaded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/search/repositories"))
      .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["alpha", "beta"])))
      .mount(&server)
      .await;
    let dir = TempDir::new().unwrap();
    let mut app = app(&server, &dir);

    app.spawn_job(PagingJob::Start);
    pump_until(&mut app, |app| app.in_flight.is_empty()).await;

    assert_eq!(app.window.items.len(), 2);
    assert_eq!(app.status, Status::Idle);
  }

  #[tokio::test]
  async fn test_retrying_failed_search_keeps_typed_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/search/repositories"))
      .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "message": "unavailable" })))
      .mount(&server)
      .await;
    let dir = TempDir::new().unwrap();
    let mut app = app(&server, &dir);

    app.start_search("kotlin".to_string());
    pump_until(&mut app, |app| app.in_flight.is_empty()).await;
    assert!(matches!(
      app.status,
      Status::Failed {
        job: PagingJob::Search,
        retryable: true,
        ..
      }
    ));

    app.handle_key(key('r'));
    pump_until(&mut app, |app| app.in_flight.is_empty()).await;

    assert_eq!(
      queries(&server).await,
      vec!["kotlin in:name,description"; 2]
    );
  }

  #[tokio::test]
  async fn test_search_replaces_one_still_loading() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("q", "first in:name,description"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(page_json(&["first-repo"]))
          .set_delay(Duration::from_millis(500)),
      )
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(query_param("q", "second in:name,description"))
      .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["second-repo"])))
      .mount(&server)
      .await;
    let dir = TempDir::new().unwrap();
    let mut app = app(&server, &dir);

    app.start_search("first".to_string());
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.start_search("second".to_string());
    pump_until(&mut app, |app| app.in_flight.is_empty()).await;

    assert_eq!(app.window.query, "second");
    let names: Vec<&str> = app.window.items.iter().map(|r| r.full_name.as_str()).collect();
    assert_eq!(names, vec!["owner/second-repo"]);
    assert_eq!(app.status, Status::Idle);
    assert!(queries(&server)
      .await
      .contains(&"second in:name,description".to_string()));
  }
}
