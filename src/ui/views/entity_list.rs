use crate::store::search::{filter_entities_by_search, sort_entities_by_name};
use crate::swapi::types::{Entity, EntityType};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::{truncate, type_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crate::ui::views::EntityDetailView;
use crate::ui::{ensure_valid_selection, move_selection};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// One entity type, sorted by the preferred order and filterable with `/`
pub struct EntityListView {
  entity_type: EntityType,
  list_state: ListState,
  search: SearchInput,
}

impl EntityListView {
  pub fn new(entity_type: EntityType) -> Self {
    Self {
      entity_type,
      list_state: ListState::default(),
      search: SearchInput::new("Filter"),
    }
  }

  /// Rows as currently shown: sorted, then filtered
  fn visible(&self, ctx: &ViewContext) -> Vec<Entity> {
    let mut entities = ctx.store.state().lists.get(self.entity_type).to_vec();
    sort_entities_by_name(&mut entities, ctx.store.preferences().sort_order);
    filter_entities_by_search(&entities, self.search.query())
      .into_iter()
      .cloned()
      .collect()
  }

  fn selected(&self, ctx: &ViewContext) -> Option<Entity> {
    let idx = self.list_state.selected()?;
    self.visible(ctx).into_iter().nth(idx)
  }

  fn title(&self, shown: usize, total: usize) -> String {
    let name = self.entity_type.display_name();
    if self.search.query().is_empty() {
      format!(" {} ({}) ", name, total)
    } else {
      format!(" {} ({}/{}) /{} ", name, shown, total, self.search.query())
    }
  }
}

/// Most telling property for the second column
fn summary_property(entity: &Entity) -> Option<String> {
  let key = match entity.entity_type {
    EntityType::Films => "release_date",
    EntityType::People => "birth_year",
    EntityType::Planets => "climate",
    EntityType::Species => "classification",
    EntityType::Starships | EntityType::Transports => "model",
    EntityType::Vehicles => "vehicle_class",
  };
  entity.property_text(key).filter(|v| !v.is_empty())
}

impl View for EntityListView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut ViewContext) -> KeyResult<ViewAction> {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(_)) => {
        self.list_state.select(Some(0));
        return KeyResult::Handled;
      }
      KeyResult::Event(SearchEvent::Submitted(_)) | KeyResult::Handled => return KeyResult::Handled,
      KeyResult::NotHandled => {}
    }

    let len = self.visible(ctx).len();
    let page = ctx.store.preferences().items_per_page.max(1) as isize;

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => move_selection(&mut self.list_state, len, 1),
      KeyCode::Char('k') | KeyCode::Up => move_selection(&mut self.list_state, len, -1),
      KeyCode::PageDown => move_selection(&mut self.list_state, len, page),
      KeyCode::PageUp => move_selection(&mut self.list_state, len, -page),
      KeyCode::Char('g') => move_selection(&mut self.list_state, len, -(len as isize)),
      KeyCode::Char('G') => move_selection(&mut self.list_state, len, len as isize),
      KeyCode::Char('f') => {
        if let Some(entity) = self.selected(ctx) {
          if let Err(e) = ctx.store.toggle_favorite(&entity) {
            ctx.store.set_error(Some(e.to_string()));
          }
        }
      }
      KeyCode::Enter => {
        if let Some(entity) = self.selected(ctx) {
          let detail = EntityDetailView::new(entity, ctx.client.clone());
          return KeyResult::Event(ViewAction::Push(Box::new(detail)));
        }
      }
      KeyCode::Esc if !self.search.query().is_empty() => self.search.reset(),
      _ => return KeyResult::NotHandled,
    }
    KeyResult::Handled
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &ViewContext) {
    let total = ctx.store.state().lists.get(self.entity_type).len();
    let entities = self.visible(ctx);
    ensure_valid_selection(&mut self.list_state, entities.len());

    let block = Block::default()
      .title(self.title(entities.len(), total))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(type_color(self.entity_type)));

    if entities.is_empty() {
      let content = if total == 0 && ctx.store.state().loading {
        "Loading..."
      } else if total == 0 {
        "Nothing loaded yet. Press 'r' to refresh."
      } else {
        "No matches."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      self.search.render_overlay(frame, area);
      return;
    }

    let show_descriptions = ctx.store.preferences().show_descriptions;
    let items: Vec<ListItem> = entities
      .iter()
      .map(|entity| {
        let star = if ctx.store.is_favorite(&entity.uid, entity.entity_type) {
          Span::styled("★ ", Style::default().fg(Color::Yellow))
        } else {
          Span::raw("  ")
        };

        let mut spans = vec![
          star,
          Span::raw(format!("{:<28}", truncate(&entity.name, 28))),
          Span::styled(
            summary_property(entity).unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
          ),
        ];
        if show_descriptions {
          if let Some(desc) = &entity.description {
            spans.push(Span::styled(
              format!("  {}", truncate(desc, 50)),
              Style::default().fg(Color::DarkGray).italic(),
            ));
          }
        }
        ListItem::new(Line::from(spans))
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
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.entity_type.display_name().to_string()
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
      ShortcutInfo::new("/", "filter").with_priority(20),
      ShortcutInfo::new("f", "favorite").with_priority(30),
      ShortcutInfo::new("s", "sort").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
