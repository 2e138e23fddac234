//! Serde-deserializable types matching GitHub search API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

use super::types::{Repo, SearchPage};

#[derive(Debug, Deserialize)]
pub struct ApiRepo {
  pub id: i64,
  pub name: String,
  pub full_name: String,
  pub description: Option<String>,
  pub html_url: String,
  #[serde(default)]
  pub stargazers_count: i64,
  #[serde(default)]
  pub forks_count: i64,
  pub language: Option<String>,
}

impl From<ApiRepo> for Repo {
  fn from(api: ApiRepo) -> Self {
    Repo {
      id: api.id,
      name: api.name,
      full_name: api.full_name,
      description: api.description,
      url: api.html_url,
      stars: api.stargazers_count,
      forks: api.forks_count,
      language: api.language,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub total_count: u64,
  #[serde(default)]
  pub incomplete_results: bool,
  #[serde(default)]
  pub items: Vec<ApiRepo>,
}

impl From<ApiSearchResponse> for SearchPage {
  fn from(api: ApiSearchResponse) -> Self {
    SearchPage {
      items: api.items.into_iter().map(Repo::from).collect(),
      total_count: api.total_count,
    }
  }
}

/// Error body GitHub returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub message: String,
}
