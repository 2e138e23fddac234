use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::paging::{Edge, WindowLoad, WindowSnapshot};

/// What a background paging task was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagingJob {
  Start,
  Search,
  Refresh,
  Edge(Edge),
}

/// Results reported back by background paging tasks
#[derive(Debug)]
pub enum PagingEvent {
  Loading(PagingJob),
  Loaded {
    job: PagingJob,
    load: Option<WindowLoad>,
    snapshot: WindowSnapshot,
  },
  Failed {
    job: PagingJob,
    message: String,
    retryable: bool,
  },
  /// The job gave up because its query was replaced
  Cancelled(PagingJob),
  /// Number of cached items for the current query after a commit
  CacheChanged(usize),
}

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh
  Tick,
  /// Report from a paging task started during search `generation`
  Paging {
    generation: u64,
    event: PagingEvent,
  },
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create the event channel. Terminal input starts with [`Self::start_input`].
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  /// Spawn the terminal reader, sending a tick whenever no key arrives
  /// within `tick_rate`
  pub fn start_input(&self, tick_rate: Duration) {
    let input_tx = self.tx.clone();

    tokio::task::spawn_blocking(move || loop {
      if event::poll(tick_rate).unwrap_or(false) {
        if let Ok(CrosstermEvent::Key(key)) = event::read() {
          if key.kind == KeyEventKind::Press && input_tx.send(Event::Key(key)).is_err() {
            break;
          }
        }
      } else if input_tx.send(Event::Tick).is_err() {
        break;
      }
    });
  }

  /// Sender for background tasks to report through
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
