//! Star-bucket separators between listed repositories.

use crate::github::types::Repo;

const STARS_PER_BUCKET: i64 = 10_000;

/// A row of the rendered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiModel<'a> {
  RepoItem(&'a Repo),
  Separator(String),
}

fn bucket(repo: &Repo) -> i64 {
  repo.stars / STARS_PER_BUCKET
}

fn bucket_label(bucket: i64) -> String {
  if bucket >= 1 {
    format!("{}0.000+ stars", bucket)
  } else {
    "< 10.000+ stars".to_string()
  }
}

/// Interleave separators into an already sorted list.
///
/// A header precedes the first item and a separator is inserted wherever the
/// star bucket drops between neighbours.
pub fn insert_separators(repos: &[Repo]) -> Vec<UiModel<'_>> {
  let mut rows = Vec::with_capacity(repos.len() + 4);
  let mut previous: Option<&Repo> = None;

  for repo in repos {
    match previous {
      None => rows.push(UiModel::Separator(bucket_label(bucket(repo)))),
      Some(before) if bucket(before) > bucket(repo) => {
        rows.push(UiModel::Separator(bucket_label(bucket(repo))))
      }
      Some(_) => {}
    }
    rows.push(UiModel::RepoItem(repo));
    previous = Some(repo);
  }

  rows
}

/// Index of the row showing `repos[item_index]` in [`insert_separators`] output.
pub fn row_of_item(rows: &[UiModel<'_>], item_index: usize) -> Option<usize> {
  rows
    .iter()
    .enumerate()
    .filter(|(_, row)| matches!(row, UiModel::RepoItem(_)))
    .nth(item_index)
    .map(|(row, _)| row)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::paging::testing::repo;

  fn labels(rows: &[UiModel<'_>]) -> Vec<String> {
    rows
      .iter()
      .map(|row| match row {
        UiModel::RepoItem(r) => format!("#{}", r.id),
        UiModel::Separator(s) => s.clone(),
      })
      .collect()
  }

  #[test]
  fn test_empty_list_has_no_rows() {
    assert!(insert_separators(&[]).is_empty());
  }

  #[test]
  fn test_header_and_bucket_drops() {
    let repos = vec![
      repo(1, 52_000),
      repo(2, 50_100),
      repo(3, 31_000),
      repo(4, 9_999),
      repo(5, 12),
    ];
    let rows = insert_separators(&repos);

    assert_eq!(
      labels(&rows),
      vec![
        "50.000+ stars",
        "#1",
        "#2",
        "30.000+ stars",
        "#3",
        "< 10.000+ stars",
        "#4",
        "#5",
      ]
    );
  }

  #[test]
  fn test_low_first_item_gets_low_header() {
    let repos = [repo(1, 500)];
    let rows = insert_separators(&repos);
    assert_eq!(labels(&rows), vec!["< 10.000+ stars", "#1"]);
  }

  #[test]
  fn test_row_of_item_skips_separators() {
    let repos = vec![repo(1, 52_000), repo(2, 31_000), repo(3, 30_500)];
    let rows = insert_separators(&repos);

    assert_eq!(row_of_item(&rows, 0), Some(1));
    assert_eq!(row_of_item(&rows, 1), Some(3));
    assert_eq!(row_of_item(&rows, 2), Some(4));
    assert_eq!(row_of_item(&rows, 3), None);
  }
}
