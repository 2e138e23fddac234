/// A repository as cached and displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
  pub id: i64,
  pub name: String,
  pub full_name: String,
  pub description: Option<String>,
  pub url: String,
  pub stars: i64,
  pub forks: i64,
  pub language: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
  pub items: Vec<Repo>,
  /// Total hits reported by the remote for the whole query
  pub total_count: u64,
}
