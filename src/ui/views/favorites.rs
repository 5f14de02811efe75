use crate::swapi::types::Entity;
use crate::ui::components::KeyResult;
use crate::ui::renderfns::{truncate, type_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crate::ui::views::EntityDetailView;
use crate::ui::{ensure_valid_selection, move_selection};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Saved favorites in the order they were added
pub struct FavoritesView {
  list_state: ListState,
}

impl FavoritesView {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
    }
  }

  fn selected<'a>(&self, ctx: &'a ViewContext) -> Option<&'a Entity> {
    ctx.store.state().favorites.get(self.list_state.selected()?)
  }
}

impl Default for FavoritesView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for FavoritesView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut ViewContext) -> KeyResult<ViewAction> {
    let len = ctx.store.state().favorites.len();
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => move_selection(&mut self.list_state, len, 1),
      KeyCode::Char('k') | KeyCode::Up => move_selection(&mut self.list_state, len, -1),
      KeyCode::Char('d') | KeyCode::Char('f') | KeyCode::Delete => {
        if let Some((uid, entity_type)) = self.selected(ctx).map(|e| (e.uid.clone(), e.entity_type)) {
          ctx.store.remove_favorite(&uid, entity_type);
          ensure_valid_selection(&mut self.list_state, len - 1);
        }
      }
      KeyCode::Enter => {
        if let Some(entity) = self.selected(ctx).cloned() {
          let detail = EntityDetailView::new(entity, ctx.client.clone());
          return KeyResult::Event(ViewAction::Push(Box::new(detail)));
        }
      }
      _ => return KeyResult::NotHandled,
    }
    KeyResult::Handled
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &ViewContext) {
    let favorites = &ctx.store.state().favorites;
    ensure_valid_selection(&mut self.list_state, favorites.len());

    let block = Block::default()
      .title(format!(" Favorites ({}) ", favorites.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    if favorites.is_empty() {
      let paragraph = Paragraph::new("No favorites yet. Press 'f' on any entry to save it.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = favorites
      .iter()
      .map(|entity| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<12}", entity.entity_type.display_name()),
            Style::default().fg(type_color(entity.entity_type)),
          ),
          Span::raw(truncate(&entity.name, 50)),
        ]))
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

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn breadcrumb_label(&self) -> String {
    "Favorites".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("d", "remove").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::swapi::types::EntityType;
  use crate::testing::{key, view_context};

  #[test]
  fn test_remove_selected() {
    let mut ctx = view_context();
    ctx
      .store
      .add_favorite(Entity::new(EntityType::People, "1", "Luke Skywalker"))
      .unwrap();
    ctx
      .store
      .add_favorite(Entity::new(EntityType::Planets, "4", "Hoth"))
      .unwrap();

    let mut view = FavoritesView::new();
    view.handle_key(key(KeyCode::Down), &mut ctx);
    view.handle_key(key(KeyCode::Char('d')), &mut ctx);

    let favorites = &ctx.store.state().favorites;
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].name, "Luke Skywalker");
    assert_eq!(view.list_state.selected(), Some(0));
  }

  #[test]
  fn test_remove_on_empty_is_noop() {
    let mut ctx = view_context();
    let mut view = FavoritesView::new();
    assert!(matches!(
      view.handle_key(key(KeyCode::Char('d')), &mut ctx),
      KeyResult::Handled
    ));
    assert!(ctx.store.state().favorites.is_empty());
  }
}
