mod footer;
mod header;
mod repo_list;
mod utils;

use crate::app::App;
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Repository list
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let window = app.window();
  header::draw_header(
    frame,
    chunks[0],
    app.api_host(),
    &window.query,
    app.cached_count(),
  );
  repo_list::draw_repo_list(frame, chunks[1], window, app.selected());
  footer::draw_footer(frame, chunks[2], app);
}
