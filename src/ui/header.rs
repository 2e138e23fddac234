use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with app name, API host, query and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, host: &str, query: &str, cached: usize) {
  let header = Line::from(vec![
    Span::styled(" ghscroll ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", host), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", display_query(query)),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::styled(
      format!("({} cached)", cached),
      Style::default().fg(Color::DarkGray),
    ),
    Span::raw("  "),
    // Shortcuts - keys and brackets highlighted, descriptions dimmed
    Span::styled("</>", Style::default().fg(Color::Cyan)),
    Span::styled(" search", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<r>", Style::default().fg(Color::Cyan)),
    Span::styled(" refresh", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(Color::Cyan)),
    Span::styled(" quit", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// An empty query searches everything
fn display_query(query: &str) -> &str {
  if query.trim().is_empty() {
    "*"
  } else {
    query
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_query() {
    assert_eq!(display_query("Android"), "Android");
    assert_eq!(display_query("  "), "*");
    assert_eq!(display_query(""), "*");
  }
}
