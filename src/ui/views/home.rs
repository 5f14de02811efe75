use crate::swapi::types::{Entity, EntityType};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::{truncate, type_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crate::ui::views::{EntityDetailView, EntityListView, FavoritesView};
use crate::ui::{ensure_valid_selection, move_selection};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

/// Names of the first `limit` entities, with a marker when more exist
fn section_summary(entities: &[Entity], limit: usize) -> String {
  let limit = limit.max(1);
  let names: Vec<&str> = entities.iter().take(limit).map(|e| e.name.as_str()).collect();
  if entities.len() > limit {
    format!("{}, ...", names.join(", "))
  } else {
    names.join(", ")
  }
}

enum HomeRow {
  Section(EntityType),
  Favorites,
  Result(Entity),
}

/// Root view: a row per section, or global search results while a search
/// term is set.
pub struct HomeView {
  list_state: ListState,
  search: SearchInput,
}

impl HomeView {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
      search: SearchInput::new("Search"),
    }
  }

  fn rows(&self, ctx: &ViewContext) -> Vec<HomeRow> {
    let state = ctx.store.state();
    if !state.search_term.is_empty() {
      return state
        .search_results
        .iter()
        .cloned()
        .map(HomeRow::Result)
        .collect();
    }

    EntityType::BROWSABLE
      .into_iter()
      .map(HomeRow::Section)
      .chain(std::iter::once(HomeRow::Favorites))
      .collect()
  }

  fn row_item(row: &HomeRow, ctx: &ViewContext) -> ListItem<'static> {
    let state = ctx.store.state();
    match row {
      HomeRow::Section(entity_type) => {
        let entities = state.lists.get(*entity_type);
        let summary = section_summary(entities, ctx.store.preferences().items_per_page);

        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<12}", entity_type.display_name()),
            Style::default().fg(type_color(*entity_type)).bold(),
          ),
          Span::styled(format!("{:>4}  ", entities.len()), Style::default().fg(Color::White)),
          Span::styled(
            truncate(&summary, 60),
            Style::default().fg(Color::DarkGray),
          ),
        ]))
      }
      HomeRow::Favorites => ListItem::new(Line::from(vec![
        Span::styled(format!("{:<12}", "Favorites"), Style::default().fg(Color::Yellow).bold()),
        Span::styled(format!("{:>4}  ", state.favorites.len()), Style::default().fg(Color::White)),
        Span::styled("★", Style::default().fg(Color::Yellow)),
      ])),
      HomeRow::Result(entity) => ListItem::new(Line::from(vec![
        Span::styled(
          format!("{:<12}", entity.entity_type.display_name()),
          Style::default().fg(type_color(entity.entity_type)),
        ),
        Span::raw(entity.name.clone()),
      ])),
    }
  }

  fn open(row: HomeRow, ctx: &ViewContext) -> Box<dyn View> {
    match row {
      HomeRow::Section(entity_type) => Box::new(EntityListView::new(entity_type)),
      HomeRow::Favorites => Box::new(FavoritesView::new()),
      HomeRow::Result(entity) => Box::new(EntityDetailView::new(entity, ctx.client.clone())),
    }
  }
}

impl Default for HomeView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for HomeView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut ViewContext) -> KeyResult<ViewAction> {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(term)) | KeyResult::Event(SearchEvent::Submitted(term)) => {
        ctx.store.search_entities(&term);
        self.list_state.select(Some(0));
        return KeyResult::Handled;
      }
      KeyResult::Handled => return KeyResult::Handled,
      KeyResult::NotHandled => {}
    }

    let rows = self.rows(ctx);
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => move_selection(&mut self.list_state, rows.len(), 1),
      KeyCode::Char('k') | KeyCode::Up => move_selection(&mut self.list_state, rows.len(), -1),
      KeyCode::Enter => {
        let idx = self.list_state.selected().unwrap_or(0);
        if let Some(row) = rows.into_iter().nth(idx) {
          return KeyResult::Event(ViewAction::Push(Self::open(row, ctx)));
        }
      }
      KeyCode::Esc if !ctx.store.state().search_term.is_empty() => {
        self.search.reset();
        ctx.store.search_entities("");
      }
      _ => return KeyResult::NotHandled,
    }
    KeyResult::Handled
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &ViewContext) {
    let rows = self.rows(ctx);
    ensure_valid_selection(&mut self.list_state, rows.len());

    let term = &ctx.store.state().search_term;
    let title = if term.is_empty() {
      format!(" Holocron ({} entries) ", ctx.store.state().lists.total())
    } else {
      format!(" Search \"{}\" ({}) ", term, rows.len())
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let items: Vec<ListItem> = if rows.is_empty() {
      vec![ListItem::new(Line::styled(
        "No matches.",
        Style::default().fg(Color::DarkGray),
      ))]
    } else {
      rows.iter().map(|row| Self::row_item(row, ctx)).collect()
    };

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Home".to_string()
  }

  fn activate_search(&mut self) {
    self.search.activate();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    if self.search.is_active() {
      return SearchInput::prompt_shortcuts();
    }
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{key, view_context};

  fn type_text(view: &mut HomeView, ctx: &mut ViewContext, text: &str) {
    for c in text.chars() {
      view.handle_key(key(KeyCode::Char(c)), ctx);
    }
  }

  #[test]
  fn test_sections_then_favorites() {
    let ctx = view_context();
    let view = HomeView::new();
    let rows = view.rows(&ctx);
    assert_eq!(rows.len(), EntityType::BROWSABLE.len() + 1);
    assert!(matches!(rows[0], HomeRow::Section(EntityType::Films)));
    assert!(matches!(rows.last(), Some(HomeRow::Favorites)));
  }

  #[test]
  fn test_search_shows_results() {
    let mut ctx = view_context();
    let mut view = HomeView::new();

    view.handle_key(key(KeyCode::Char('/')), &mut ctx);
    type_text(&mut view, &mut ctx, "wing");
    view.handle_key(key(KeyCode::Enter), &mut ctx);

    assert_eq!(ctx.store.state().search_term, "wing");
    let rows = view.rows(&ctx);
    assert_eq!(rows.len(), 1);
    assert!(matches!(&rows[0], HomeRow::Result(e) if e.name == "X-wing"));

    // Esc after the prompt closed goes back to sections
    view.handle_key(key(KeyCode::Esc), &mut ctx);
    assert!(ctx.store.state().search_term.is_empty());
    assert_eq!(view.rows(&ctx).len(), EntityType::BROWSABLE.len() + 1);
  }

  #[test]
  fn test_enter_opens_section() {
    let mut ctx = view_context();
    let mut view = HomeView::new();
    view.handle_key(key(KeyCode::Down), &mut ctx);

    match view.handle_key(key(KeyCode::Enter), &mut ctx) {
      KeyResult::Event(ViewAction::Push(next)) => assert_eq!(next.breadcrumb_label(), "Characters"),
      _ => panic!("expected a pushed list view"),
    }
  }

  #[test]
  fn test_section_summary_follows_items_per_page() {
    let mut ctx = view_context();
    let characters = ctx.store.state().lists.get(EntityType::People).to_vec();
    assert_eq!(characters.len(), 6);

    let default_limit = ctx.store.preferences().items_per_page;
    assert!(!section_summary(&characters, default_limit).ends_with("..."));

    ctx.store.update_preferences(|p| p.items_per_page = 2);
    let limit = ctx.store.preferences().items_per_page;
    assert_eq!(
      section_summary(&characters, limit),
      format!("{}, {}, ...", characters[0].name, characters[1].name)
    );
  }

  #[test]
  fn test_open_prompt_swaps_shortcuts() {
    let mut ctx = view_context();
    let mut view = HomeView::new();
    assert!(view.shortcuts().iter().any(|s| s.key == "/"));

    view.handle_key(key(KeyCode::Char('/')), &mut ctx);
    assert_eq!(view.shortcuts(), SearchInput::prompt_shortcuts());
  }
}
