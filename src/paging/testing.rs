//! Test doubles for the remote source.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::RepoSource;
use crate::error::TransportError;
use crate::github::types::{Repo, SearchPage};

pub fn repo(id: i64, stars: i64) -> Repo {
  Repo {
    id,
    name: format!("repo{}", id),
    full_name: format!("owner/repo{}", id),
    description: Some(format!("repository {}", id)),
    url: format!("https://github.com/owner/repo{}", id),
    stars,
    forks: 0,
    language: Some("Kotlin".to_string()),
  }
}

/// Serves canned pages and records every request. Unknown pages are empty.
#[derive(Default)]
pub struct FakeSource {
  pages: Mutex<HashMap<u32, Vec<Repo>>>,
  calls: Mutex<Vec<(String, u32, u32)>>,
  failure: Mutex<Option<TransportError>>,
}

impl FakeSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_page(self, page: u32, repos: Vec<Repo>) -> Self {
    self.set_page(page, repos);
    self
  }

  pub fn set_page(&self, page: u32, repos: Vec<Repo>) {
    self.pages.lock().unwrap().insert(page, repos);
  }

  /// Make the next request fail with `error`.
  pub fn fail_next(&self, error: TransportError) {
    *self.failure.lock().unwrap() = Some(error);
  }

  /// Requested page numbers, in order
  pub fn pages_requested(&self) -> Vec<u32> {
    self.calls.lock().unwrap().iter().map(|(_, page, _)| *page).collect()
  }

  pub fn last_request(&self) -> Option<(String, u32, u32)> {
    self.calls.lock().unwrap().last().cloned()
  }
}

#[async_trait]
impl RepoSource for FakeSource {
  async fn search_repos(
    &self,
    query: &str,
    page: u32,
    per_page: u32,
  ) -> Result<SearchPage, TransportError> {
    self
      .calls
      .lock()
      .unwrap()
      .push((query.to_string(), page, per_page));

    if let Some(error) = self.failure.lock().unwrap().take() {
      return Err(error);
    }

    let items = self
      .pages
      .lock()
      .unwrap()
      .get(&page)
      .cloned()
      .unwrap_or_default();
    Ok(SearchPage {
      total_count: items.len() as u64,
      items,
    })
  }
}

/// A source whose requests never complete.
pub struct StalledSource;

#[async_trait]
impl RepoSource for StalledSource {
  async fn search_repos(
    &self,
    _query: &str,
    _page: u32,
    _per_page: u32,
  ) -> Result<SearchPage, TransportError> {
    std::future::pending().await
  }
}
