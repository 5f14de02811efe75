use crate::query::{Query, QueryState};
use crate::swapi::client::SwapiClient;
use crate::swapi::types::Entity;
use crate::ui::components::KeyResult;
use crate::ui::renderfns::type_color;
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Full record for one entity, fetched through the request queue. The
/// summary from the list stays on screen while loading or if the fetch
/// comes back empty.
pub struct EntityDetailView {
  summary: Entity,
  query: Query<Option<Entity>>,
  scroll: u16,
}

impl EntityDetailView {
  pub fn new(summary: Entity, client: SwapiClient) -> Self {
    let entity_type = summary.entity_type;
    let uid = summary.uid.clone();
    let mut query = Query::new(move || {
      let client = client.clone();
      let uid = uid.clone();
      async move { client.fetch_entity_details(entity_type, &uid).await }
    });

    query.fetch();

    Self {
      summary,
      query,
      scroll: 0,
    }
  }

  /// Detailed record when it arrived, else the list summary
  fn entity(&self) -> &Entity {
    match self.query.data() {
      Some(Some(detail)) => detail,
      _ => &self.summary,
    }
  }

  fn status_line(&self) -> Option<Line<'static>> {
    match self.query.state() {
      QueryState::Loading => Some(Line::styled(
        "Loading details...",
        Style::default().fg(Color::DarkGray),
      )),
      QueryState::Ready(None) => Some(Line::styled(
        "Details unavailable, showing stored summary. Press 'r' to retry.",
        Style::default().fg(Color::Red),
      )),
      _ => None,
    }
  }
}

/// "release_date" -> "Release date"
fn property_label(key: &str) -> String {
  let spaced = key.replace('_', " ");
  let mut chars = spaced.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

impl View for EntityDetailView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut ViewContext) -> KeyResult<ViewAction> {
    match key.code {
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('f') => {
        let entity = self.entity().clone();
        if let Err(e) = ctx.store.toggle_favorite(&entity) {
          ctx.store.set_error(Some(e.to_string()));
        }
      }
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      _ => return KeyResult::NotHandled,
    }
    KeyResult::Handled
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &ViewContext) {
    let entity = self.entity();
    let favorite = ctx.store.is_favorite(&entity.uid, entity.entity_type);

    let title = format!(
      " {}{} ",
      if favorite { "★ " } else { "" },
      entity.name
    );
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(type_color(entity.entity_type)));

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![Line::from(vec![
      Span::styled("Type: ", label),
      Span::styled(
        entity.entity_type.display_name(),
        Style::default().fg(type_color(entity.entity_type)),
      ),
      Span::raw("  "),
      Span::styled("ID: ", label),
      Span::raw(entity.uid.clone()),
    ])];

    if let Some(status) = self.status_line() {
      lines.push(status);
    }
    lines.push(Line::raw(""));

    for key in entity.properties.keys() {
      let value = entity.property_text(key).unwrap_or_default();
      if value.is_empty() {
        continue;
      }
      lines.push(Line::from(vec![
        Span::styled(format!("{:<20}", property_label(key)), label),
        Span::raw(value),
      ]));
    }

    if let Some(desc) = &entity.description {
      lines.push(Line::raw(""));
      lines.push(Line::raw(desc.clone()));
    }

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.summary.name.clone()
  }

  fn tick(&mut self, _ctx: &mut ViewContext) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("f", "favorite").with_priority(10),
      ShortcutInfo::new("r", "reload").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::ManualClock;
  use crate::swapi::types::EntityType;
  use crate::testing::{fake_client, key, start_time, view_context, FakeTransport, BASE_URL};
  use serde_json::json;
  use std::sync::Arc;
  use std::time::Duration;

  #[test]
  fn test_property_label() {
    assert_eq!(property_label("release_date"), "Release date");
    assert_eq!(property_label("model"), "Model");
    assert_eq!(property_label(""), "");
  }

  #[tokio::test]
  async fn test_detail_replaces_summary() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond(
      &format!("{}/planets/4", BASE_URL),
      json!({"result": {"uid": "4", "properties": {"name": "Hoth", "gravity": "1.1 standard"}}}),
    );
    let client = fake_client(transport, ManualClock::new(start_time()));

    let summary = Entity::new(EntityType::Planets, "4", "Hoth");
    let mut view = EntityDetailView::new(summary, client);
    assert!(view.entity().properties.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    view.query.poll();

    assert_eq!(view.entity().property_text("gravity").as_deref(), Some("1.1 standard"));
    assert!(view.status_line().is_none());
  }

  #[tokio::test]
  async fn test_failed_fetch_keeps_summary() {
    let client = fake_client(Arc::new(FakeTransport::new()), ManualClock::new(start_time()));
    let summary = Entity::new(EntityType::Planets, "99", "Nowhere");
    let mut view = EntityDetailView::new(summary, client);

    tokio::time::sleep(Duration::from_millis(50)).await;
    view.query.poll();

    assert_eq!(view.entity().name, "Nowhere");
    assert!(view.status_line().is_some());
  }

  #[tokio::test]
  async fn test_f_favorites_shown_entity() {
    let mut ctx = view_context();
    let summary = Entity::new(EntityType::Films, "1", "A New Hope");
    let mut view = EntityDetailView::new(summary, ctx.client.clone());

    view.handle_key(key(KeyCode::Char('f')), &mut ctx);
    assert!(ctx.store.is_favorite("1", EntityType::Films));
  }
}
