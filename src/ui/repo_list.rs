use super::utils::{format_stars, truncate};
use crate::github::types::Repo;
use crate::paging::separators::{insert_separators, row_of_item, UiModel};
use crate::paging::WindowSnapshot;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

pub fn draw_repo_list(frame: &mut Frame, area: Rect, window: &WindowSnapshot, selected: usize) {
  let end = window.offset + window.items.len();
  let title = if window.items.is_empty() {
    " Repositories ".to_string()
  } else {
    format!(" Repositories [{}-{}] ", window.offset + 1, end)
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if window.items.is_empty() {
    let paragraph = Paragraph::new("No repositories loaded.")
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let rows = insert_separators(&window.items);
  let width = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = rows
    .iter()
    .map(|row| match row {
      UiModel::RepoItem(repo) => repo_item(repo, width),
      UiModel::Separator(label) => ListItem::new(Line::from(Span::styled(
        format!("── {} ", label),
        Style::default().fg(Color::Magenta).bold(),
      ))),
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(row_of_item(&rows, selected));

  frame.render_stateful_widget(list, area, &mut state);
}

fn repo_item(repo: &Repo, width: usize) -> ListItem<'static> {
  let title = Line::from(vec![
    Span::styled(
      format!("{:>7} ", format_stars(repo.stars)),
      Style::default().fg(Color::Yellow),
    ),
    Span::styled(
      truncate(&repo.full_name, 50),
      Style::default().fg(Color::Cyan),
    ),
    Span::raw(" "),
    Span::styled(
      repo.language.clone().unwrap_or_default(),
      Style::default().fg(Color::Green),
    ),
    Span::styled(
      format!("  {} forks", repo.forks),
      Style::default().fg(Color::DarkGray),
    ),
  ]);

  let description = repo.description.as_deref().unwrap_or("No description");
  let detail = Line::from(Span::styled(
    format!("        {}", truncate(description, width.saturating_sub(8))),
    Style::default().fg(Color::Gray),
  ));

  ListItem::new(vec![title, detail])
}
