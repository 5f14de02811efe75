use crate::store::preferences::SortOrder;
use crate::ui::renderfns::relative_age;
use crate::ui::view::ShortcutInfo;
use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Everything the header shows besides shortcuts
pub struct HeaderInfo<'a> {
  pub title: &'a str,
  pub is_online: bool,
  pub loading: bool,
  pub last_fetch: Option<DateTime<Utc>>,
  pub sort_order: SortOrder,
  pub now: DateTime<Utc>,
}

/// Draw the header bar with title, connection state and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, info: &HeaderInfo, shortcuts: &[ShortcutInfo]) {
  let sep = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let (status, status_color) = match (info.is_online, info.loading) {
    (false, _) => ("● offline", Color::Red),
    (true, true) => ("● loading", Color::Yellow),
    (true, false) => ("● online", Color::Green),
  };

  let fetched = match info.last_fetch {
    Some(at) => format!(" updated {} ", relative_age(at, info.now)),
    None => " preview data ".to_string(),
  };

  let mut spans = vec![
    Span::styled(" holocron ", Style::default().fg(Color::Yellow).bold()),
    sep(),
    Span::styled(format!(" {} ", info.title), Style::default().fg(Color::White)),
    sep(),
    Span::styled(format!(" {} ", status), Style::default().fg(status_color)),
    sep(),
    Span::styled(fetched, Style::default().fg(Color::DarkGray)),
    sep(),
    Span::styled(
      format!(" {} ", info.sort_order.label()),
      Style::default().fg(Color::Cyan),
    ),
    Span::raw(" "),
  ];

  spans.extend(shortcut_spans(shortcuts));

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Keys and brackets highlighted, descriptions dimmed, lowest priority first
fn shortcut_spans(shortcuts: &[ShortcutInfo]) -> Vec<Span<'static>> {
  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);

  sorted
    .into_iter()
    .flat_map(|s| {
      [
        Span::raw("  "),
        Span::styled(format!("<{}>", s.key), Style::default().fg(Color::Cyan)),
        Span::styled(format!(" {}", s.label), Style::default().fg(Color::DarkGray)),
      ]
    })
    .collect()
}
