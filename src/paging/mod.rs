//! Mediation between the paginated GitHub search and the local cache.
//!
//! - [`mediator::RemoteMediator`] decides what to fetch for a load and commits the
//!   result into the key and item stores in one transaction
//! - [`Pager`] is the windowed read path: it serves pages from the cache
//!   and calls the mediator when a read runs past the cached rows
//! - [`separators`] decorates an item list for display

mod cancel;
mod mediator;
mod pager;
pub mod separators;
mod source;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use pager::{Edge, Pager, WindowLoad, WindowSnapshot};
pub use source::RepoSource;
pub use state::PagingConfig;

use crate::db::QueryScope;

/// The search the cache is currently serving.
///
/// Owned by the pager and handed to every mediator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSession {
  query: String,
  scope: QueryScope,
}

impl SearchSession {
  pub fn new(query: &str) -> Self {
    let query = query.trim().to_string();
    let scope = QueryScope::for_query(&query);
    Self { query, scope }
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn scope(&self) -> &QueryScope {
    &self.scope
  }

  /// Whether `query` would be served by this session's cached rows
  pub fn matches(&self, query: &str) -> bool {
    self.scope == QueryScope::for_query(query)
  }
}
