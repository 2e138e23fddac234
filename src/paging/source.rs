use async_trait::async_trait;

use crate::error::TransportError;
use crate::github::types::SearchPage;

/// Remote capability the mediator pages through.
///
/// `page` is a 1-based page index. An empty page means the result set is
/// exhausted in that direction.
#[async_trait]
pub trait RepoSource: Send + Sync {
  async fn search_repos(
    &self,
    query: &str,
    page: u32,
    per_page: u32,
  ) -> Result<SearchPage, TransportError>;
}
