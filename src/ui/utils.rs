/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Compact star count, e.g. 12345 -> "12.3k"
pub fn format_stars(stars: i64) -> String {
  if stars >= 1_000_000 {
    format!("{:.1}m", stars as f64 / 1_000_000.0)
  } else if stars >= 1_000 {
    format!("{:.1}k", stars as f64 / 1_000.0)
  } else {
    stars.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("ｆｕｌｌｗｉｄｔｈ", 5), "ｆｕ...");
  }

  #[test]
  fn test_format_stars() {
    assert_eq!(format_stars(999), "999");
    assert_eq!(format_stars(12_345), "12.3k");
    assert_eq!(format_stars(2_450_000), "2.5m");
  }
}
