//! Typed errors for the paging core.
//!
//! The application layer works with `color_eyre::Result`; these types are
//! what the mediator and stores hand back so callers can decide between a
//! retry affordance and giving up.

use std::path::PathBuf;

/// Failure while fetching a page from the remote source.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
  /// Connection, DNS, TLS or timeout failure.
  #[error("network error: {message}")]
  Network { message: String },

  /// The remote answered with a non-success status.
  #[error("HTTP {status}: {message}")]
  Http { status: u16, message: String },

  /// The response body could not be decoded.
  #[error("failed to decode response: {message}")]
  Decode { message: String },
}

impl From<reqwest::Error> for TransportError {
  fn from(e: reqwest::Error) -> Self {
    match e.status() {
      Some(status) => TransportError::Http {
        status: status.as_u16(),
        message: e.to_string(),
      },
      None => TransportError::Network {
        message: e.to_string(),
      },
    }
  }
}

/// Failure inside the local cache database.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("cache lock poisoned")]
  LockPoisoned,

  #[error("failed to create cache directory {}: {source}", path.display())]
  CacheDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("could not determine data directory")]
  NoDataDir,
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
  fn from(_: std::sync::PoisonError<T>) -> Self {
    StoreError::LockPoisoned
  }
}

/// Outcome of a failed `load` call.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  #[error(transparent)]
  Transport(#[from] TransportError),

  #[error(transparent)]
  Store(#[from] StoreError),

  /// The load was cancelled before its fetch completed. Nothing was written.
  #[error("load cancelled")]
  Cancelled,
}

impl LoadError {
  /// Whether retrying the same load can reasonably succeed.
  pub fn is_retryable(&self) -> bool {
    matches!(self, LoadError::Transport(_) | LoadError::Cancelled)
  }
}
