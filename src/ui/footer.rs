use crate::app::{App, Mode, Status};
use crate::event::PagingJob;
use crate::paging::Edge;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the status bar: search input, load state or key hints
pub fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.mode() {
    Mode::Search => (
      format!("/{}", app.search_input()),
      Style::default().fg(Color::Cyan),
    ),
    Mode::Normal => status_line(app.status()),
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}

fn status_line(status: &Status) -> (String, Style) {
  match status {
    Status::Idle => (
      " /search  j/k:nav  Enter:url  r:refresh  q:quit".to_string(),
      Style::default().fg(Color::DarkGray),
    ),
    Status::Loading(job) => (
      format!(" {}...", job_label(*job)),
      Style::default().fg(Color::Yellow),
    ),
    Status::Failed {
      job,
      message,
      retryable,
    } => {
      let hint = if *retryable { "  (r to retry)" } else { "" };
      (
        format!(" {} failed: {}{}", job_label(*job), message, hint),
        Style::default().fg(Color::Red),
      )
    }
    Status::EndOfResults => (
      " End of results".to_string(),
      Style::default().fg(Color::DarkGray),
    ),
    Status::Message(message) => (format!(" {}", message), Style::default().fg(Color::White)),
  }
}

fn job_label(job: PagingJob) -> &'static str {
  match job {
    PagingJob::Start => "Loading",
    PagingJob::Search => "Searching",
    PagingJob::Refresh => "Refreshing",
    PagingJob::Edge(Edge::Top) => "Loading previous page",
    PagingJob::Edge(Edge::Bottom) => "Loading next page",
  }
}
