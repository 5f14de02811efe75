use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Message shown on the right side of the footer
pub enum StatusLine<'a> {
  Info(&'a str),
  Error(&'a str),
}

/// Draw the footer bar with view breadcrumb and the latest status
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], status: Option<StatusLine>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(area);

  frame.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
    chunks[0],
  );

  let status = match status {
    Some(StatusLine::Info(msg)) => Span::styled(format!("{} ", msg), Style::default().fg(Color::Gray)),
    Some(StatusLine::Error(msg)) => Span::styled(format!("{} ", msg), Style::default().fg(Color::Red)),
    None => Span::raw(""),
  };
  frame.render_widget(
    Paragraph::new(Line::from(status))
      .alignment(Alignment::Right)
      .style(Style::default().bg(Color::Black)),
    chunks[1],
  );
}
