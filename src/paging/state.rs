use crate::config::PagingSettings;
use crate::github::types::Repo;

/// Which edge of the loaded data a load is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadType {
  /// First load, or a full reload after the query changed
  Refresh,
  /// Load before the first loaded item
  Prepend,
  /// Load after the last loaded item
  Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
  pub page_size: u32,
  pub prefetch_distance: u32,
  pub max_size: u32,
}

impl From<&PagingSettings> for PagingConfig {
  fn from(settings: &PagingSettings) -> Self {
    Self {
      page_size: settings.page_size,
      prefetch_distance: settings.prefetch_distance,
      max_size: settings.max_size,
    }
  }
}

impl Default for PagingConfig {
  fn default() -> Self {
    Self::from(&PagingSettings::default())
  }
}

/// A page of items read from the cache, at `offset` in the sorted list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
  pub offset: usize,
  pub data: Vec<Repo>,
}

/// Snapshot of what the read path has loaded, handed to the mediator.
#[derive(Debug, Clone)]
pub struct PagingState {
  /// Loaded pages, ordered by offset
  pub pages: Vec<LoadedPage>,
  /// Absolute index of the item last viewed
  pub anchor_position: Option<usize>,
  pub config: PagingConfig,
}

impl PagingState {
  pub fn new(pages: Vec<LoadedPage>, anchor_position: Option<usize>, config: PagingConfig) -> Self {
    Self {
      pages,
      anchor_position,
      config,
    }
  }

  /// First item of the first page that has any items
  pub fn first_item_or_none(&self) -> Option<&Repo> {
    self
      .pages
      .iter()
      .find(|page| !page.data.is_empty())
      .and_then(|page| page.data.first())
  }

  /// Last item of the last page that has any items
  pub fn last_item_or_none(&self) -> Option<&Repo> {
    self
      .pages
      .iter()
      .rev()
      .find(|page| !page.data.is_empty())
      .and_then(|page| page.data.last())
  }

  /// The loaded item at `position`, or the loaded item nearest to it.
  pub fn closest_item_to_position(&self, position: usize) -> Option<&Repo> {
    let mut closest: Option<(usize, &Repo)> = None;

    for page in self.pages.iter().filter(|page| !page.data.is_empty()) {
      let start = page.offset;
      let end = start + page.data.len() - 1;

      let (distance, item) = if position < start {
        (start - position, &page.data[0])
      } else if position > end {
        (position - end, &page.data[page.data.len() - 1])
      } else {
        return Some(&page.data[position - start]);
      };

      if closest.map_or(true, |(best, _)| distance < best) {
        closest = Some((distance, item));
      }
    }

    closest.map(|(_, item)| item)
  }
}

/// A load resolved against a state, carrying only the item it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
  Refresh { anchor_item: Option<i64> },
  Prepend { first_item: Option<i64> },
  Append { last_item: Option<i64> },
}

impl LoadRequest {
  pub fn resolve(load_type: LoadType, state: &PagingState) -> Self {
    match load_type {
      LoadType::Refresh => LoadRequest::Refresh {
        anchor_item: state
          .anchor_position
          .and_then(|position| state.closest_item_to_position(position))
          .map(|repo| repo.id),
      },
      LoadType::Prepend => LoadRequest::Prepend {
        first_item: state.first_item_or_none().map(|repo| repo.id),
      },
      LoadType::Append => LoadRequest::Append {
        last_item: state.last_item_or_none().map(|repo| repo.id),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::paging::testing::repo;

  fn state(pages: Vec<LoadedPage>, anchor: Option<usize>) -> PagingState {
    PagingState::new(pages, anchor, PagingConfig::default())
  }

  fn page(offset: usize, ids: &[i64]) -> LoadedPage {
    LoadedPage {
      offset,
      data: ids.iter().map(|&id| repo(id, 100 - id)).collect(),
    }
  }

  #[test]
  fn test_edges_skip_empty_pages() {
    let s = state(
      vec![page(0, &[]), page(0, &[1, 2]), page(2, &[3, 4]), page(4, &[])],
      None,
    );
    assert_eq!(s.first_item_or_none().map(|r| r.id), Some(1));
    assert_eq!(s.last_item_or_none().map(|r| r.id), Some(4));
  }

  #[test]
  fn test_empty_state_has_no_edges() {
    let s = state(vec![page(0, &[])], Some(3));
    assert!(s.first_item_or_none().is_none());
    assert!(s.last_item_or_none().is_none());
    assert!(s.closest_item_to_position(3).is_none());
  }

  #[test]
  fn test_closest_item_inside_and_outside_window() {
    let s = state(vec![page(10, &[1, 2]), page(12, &[3, 4])], None);
    assert_eq!(s.closest_item_to_position(11).map(|r| r.id), Some(2));
    assert_eq!(s.closest_item_to_position(13).map(|r| r.id), Some(4));
    assert_eq!(s.closest_item_to_position(0).map(|r| r.id), Some(1));
    assert_eq!(s.closest_item_to_position(99).map(|r| r.id), Some(4));
  }

  #[test]
  fn test_resolve_carries_the_edge_item() {
    let s = state(vec![page(0, &[1, 2]), page(2, &[3, 4])], Some(2));

    assert_eq!(
      LoadRequest::resolve(LoadType::Append, &s),
      LoadRequest::Append { last_item: Some(4) }
    );
    assert_eq!(
      LoadRequest::resolve(LoadType::Prepend, &s),
      LoadRequest::Prepend { first_item: Some(1) }
    );
    assert_eq!(
      LoadRequest::resolve(LoadType::Refresh, &s),
      LoadRequest::Refresh {
        anchor_item: Some(3)
      }
    );

    let no_anchor = state(vec![page(0, &[1, 2])], None);
    assert_eq!(
      LoadRequest::resolve(LoadType::Refresh, &no_anchor),
      LoadRequest::Refresh { anchor_item: None }
    );
  }
}
