use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::ACCEPT;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::TransportError;
use crate::github::api_types::{ApiErrorBody, ApiSearchResponse};
use crate::github::types::SearchPage;
use crate::paging::RepoSource;

/// Restricts matches to repository names and descriptions
pub const IN_QUALIFIER: &str = "in:name,description";

const USER_AGENT: &str = concat!("ghscroll/", env!("CARGO_PKG_VERSION"));

/// GitHub search API client
#[derive(Clone)]
pub struct GithubClient {
  http: reqwest::Client,
  base_url: Url,
  token: Option<String>,
}

impl GithubClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_base_url(&config.github.api_url, Config::get_api_token())
  }

  pub fn with_base_url(api_url: &str, token: Option<String>) -> Result<Self> {
    // Url::join drops the last path segment unless it ends with a slash
    let normalized = if api_url.ends_with('/') {
      api_url.to_string()
    } else {
      format!("{}/", api_url)
    };
    let base_url =
      Url::parse(&normalized).map_err(|e| eyre!("Invalid GitHub API url {}: {}", api_url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(USER_AGENT)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      token,
    })
  }

  /// Host shown in the header bar
  pub fn host(&self) -> &str {
    self.base_url.host_str().unwrap_or("github")
  }

  fn search_url(&self, query: &str, page: u32, per_page: u32) -> Result<Url, TransportError> {
    let mut url = self
      .base_url
      .join("search/repositories")
      .map_err(|e| TransportError::Network {
        message: format!("invalid search url: {}", e),
      })?;

    url
      .query_pairs_mut()
      .append_pair("q", &api_query(query))
      .append_pair("sort", "stars")
      .append_pair("page", &page.to_string())
      .append_pair("per_page", &per_page.to_string());

    Ok(url)
  }
}

/// Build the remote query string from what the user typed
pub fn api_query(query: &str) -> String {
  let query = query.trim();
  if query.is_empty() {
    IN_QUALIFIER.to_string()
  } else {
    format!("{} {}", query, IN_QUALIFIER)
  }
}

#[async_trait]
impl RepoSource for GithubClient {
  async fn search_repos(
    &self,
    query: &str,
    page: u32,
    per_page: u32,
  ) -> Result<SearchPage, TransportError> {
    let url = self.search_url(query, page, per_page)?;
    debug!(%url, "searching repositories");

    let mut request = self
      .http
      .get(url)
      .header(ACCEPT, "application/vnd.github+json");
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);
      warn!(status = status.as_u16(), %message, "search request failed");
      return Err(TransportError::Http {
        status: status.as_u16(),
        message,
      });
    }

    let parsed: ApiSearchResponse =
      serde_json::from_str(&body).map_err(|e| TransportError::Decode {
        message: e.to_string(),
      })?;

    if parsed.incomplete_results {
      warn!(page, "GitHub reported incomplete search results");
    }

    Ok(parsed.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use wiremock::matchers::{header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn repo_json(id: i64, name: &str, stars: i64) -> serde_json::Value {
    json!({
      "id": id,
      "name": name,
      "full_name": format!("owner/{}", name),
      "description": "a repo",
      "html_url": format!("https://github.com/owner/{}", name),
      "stargazers_count": stars,
      "forks_count": 3,
      "language": "Kotlin"
    })
  }

  #[test]
  fn test_api_query_appends_qualifier() {
    assert_eq!(api_query("android"), "android in:name,description");
    assert_eq!(api_query("  android  "), "android in:name,description");
    assert_eq!(api_query(""), "in:name,description");
  }

  #[tokio::test]
  async fn test_search_parses_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/search/repositories"))
      .and(query_param("q", "android in:name,description"))
      .and(query_param("sort", "stars"))
      .and(query_param("page", "2"))
      .and(query_param("per_page", "30"))
      .and(header("accept", "application/vnd.github+json"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "total_count": 2,
        "incomplete_results": false,
        "items": [repo_json(1, "alpha", 500), repo_json(2, "beta", 10)]
      })))
      .mount(&server)
      .await;

    let client = GithubClient::with_base_url(&server.uri(), None).unwrap();
    let page = client.search_repos("android", 2, 30).await.unwrap();

    assert_eq!(page.total_count, 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].full_name, "owner/alpha");
    assert_eq!(page.items[0].url, "https://github.com/owner/alpha");
    assert_eq!(page.items[0].stars, 500);
    assert_eq!(page.items[1].language.as_deref(), Some("Kotlin"));
  }

  #[tokio::test]
  async fn test_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(header("authorization", "Bearer secret"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
      .expect(1)
      .mount(&server)
      .await;

    let client = GithubClient::with_base_url(&server.uri(), Some("secret".to_string())).unwrap();
    let page = client.search_repos("rust", 1, 10).await.unwrap();
    assert!(page.items.is_empty());
  }

  #[tokio::test]
  async fn test_non_success_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(
        ResponseTemplate::new(403).set_body_json(json!({ "message": "API rate limit exceeded" })),
      )
      .mount(&server)
      .await;

    let client = GithubClient::with_base_url(&server.uri(), None).unwrap();
    let err = client.search_repos("android", 1, 30).await.unwrap_err();

    match err {
      TransportError::Http { status, message } => {
        assert_eq!(status, 403);
        assert_eq!(message, "API rate limit exceeded");
      }
      other => panic!("expected Http error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let client = GithubClient::with_base_url(&server.uri(), None).unwrap();
    let err = client.search_repos("android", 1, 30).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode { .. }));
  }

  #[tokio::test]
  async fn test_base_url_with_path_keeps_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v3/search/repositories"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
      .expect(1)
      .mount(&server)
      .await;

    let client = GithubClient::with_base_url(&format!("{}/api/v3", server.uri()), None).unwrap();
    client.search_repos("android", 1, 30).await.unwrap();
  }
}
