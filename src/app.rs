use crate::event::{Event, EventHandler};
use crate::query::Query;
use crate::store::state::Action;
use crate::store::LoadPlan;
use crate::swapi::client::ListOutcome;
use crate::swapi::types::EntityType;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header, HeaderInfo, StatusLine};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crate::ui::views::{EntityListView, FavoritesView, HomeView};
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main application state
pub struct App {
  /// Navigation stack; the home view is always at index 0
  view_stack: Vec<Box<dyn View>>,
  ctx: ViewContext,
  command: CommandInput,
  /// Background fetch of every list
  refresh: Query<Vec<ListOutcome>>,
  /// Last informational message for the footer
  status: Option<String>,
  title: String,
  should_quit: bool,
}

fn command_shortcuts() -> Vec<ShortcutInfo> {
  vec![
    ShortcutInfo::new("Tab", "complete").with_priority(10),
    ShortcutInfo::new("Enter", "run").with_priority(20),
    ShortcutInfo::new("Esc", "cancel").with_priority(90),
  ]
}

/// Restores the terminal when dropped, including on early return
struct TerminalGuard;

impl Drop for TerminalGuard {
  fn drop(&mut self) {
    restore_terminal();
  }
}

fn restore_terminal() {
  let _ = disable_raw_mode();
  let _ = execute!(stdout(), LeaveAlternateScreen);
}

/// Put the terminal back before the panic report is printed
fn install_panic_hook() {
  let previous = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    restore_terminal();
    previous(info);
  }));
}

impl App {
  pub fn new(ctx: ViewContext, title: String) -> Self {
    let client = ctx.client.clone();
    let refresh = Query::new(move || {
      let client = client.clone();
      async move { client.fetch_all_lists().await }
    });

    Self {
      view_stack: vec![Box::new(HomeView::new())],
      ctx,
      command: CommandInput::new(),
      refresh,
      status: None,
      title,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    install_panic_hook();
    enable_raw_mode().map_err(|e| eyre!("Failed to enable raw mode: {}", e))?;
    let _guard = TerminalGuard;
    execute!(stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    self.start();
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    info!("exiting");
    Ok(())
  }

  /// Load stored state, then refresh in the background unless a fresh
  /// snapshot was found.
  fn start(&mut self) -> LoadPlan {
    let plan = self.ctx.store.hydrate();
    match plan {
      LoadPlan::NeedsRefresh => self.start_refresh(),
      LoadPlan::FromStorage => self.status = Some("using stored data".to_string()),
    }
    plan
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let state = self.ctx.store.state();
    let shortcuts = if self.command.is_active() {
      command_shortcuts()
    } else {
      self
        .view_stack
        .last()
        .map(|v| v.shortcuts())
        .unwrap_or_default()
    };
    let header = HeaderInfo {
      title: &self.title,
      is_online: state.is_online,
      loading: state.loading,
      last_fetch: state.last_fetch,
      sort_order: self.ctx.store.preferences().sort_order,
      now: self.ctx.store.now(),
    };
    draw_header(frame, chunks[0], &header, &shortcuts);

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1], &self.ctx);
    }
    self.command.render_overlay(frame, chunks[1]);

    let breadcrumb: Vec<String> = self.view_stack.iter().map(|v| v.breadcrumb_label()).collect();
    let status = match (&self.ctx.store.state().error, &self.status) {
      (Some(error), _) => Some(StatusLine::Error(error)),
      (None, Some(msg)) => Some(StatusLine::Info(msg)),
      (None, None) => None,
    };
    draw_footer(frame, chunks[2], &breadcrumb, status);
  }

  fn tick(&mut self) {
    if self.refresh.poll() {
      if let Some(outcomes) = self.refresh.take() {
        let total = outcomes.len();
        let summary = self.ctx.store.apply_refresh(outcomes);
        debug!(
          refreshed = summary.refreshed,
          failed = summary.failed,
          took = ?self.refresh.finished_in(),
          "refresh applied"
        );
        self.status = Some(format!("refreshed {} of {} lists", summary.refreshed, total));
      } else {
        // The background task died without a result
        self.ctx.store.dispatch(Action::SetLoading(false));
      }
    }
    self.ctx.store.sync_connectivity();

    if let Some(view) = self.view_stack.last_mut() {
      view.tick(&mut self.ctx);
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.command.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(cmd)) => {
        self.execute_command(&cmd);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    let result = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key, &mut self.ctx),
      None => KeyResult::NotHandled,
    };
    match result {
      KeyResult::Event(ViewAction::Push(next)) => {
        self.view_stack.push(next);
        return;
      }
      KeyResult::Event(ViewAction::Pop) => {
        self.pop_view();
        return;
      }
      KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('r') => self.start_refresh(),
      KeyCode::Char('s') => self.toggle_sort(),
      KeyCode::Char('q') if self.view_stack.len() == 1 => self.should_quit = true,
      KeyCode::Char('q') | KeyCode::Esc => self.pop_view(),
      _ => {}
    }
  }

  fn pop_view(&mut self) {
    if self.view_stack.len() > 1 {
      self.view_stack.pop();
    }
  }

  /// Replace everything above home with `view`
  fn show(&mut self, view: Option<Box<dyn View>>) {
    self.view_stack.truncate(1);
    self.view_stack.extend(view);
  }

  fn start_refresh(&mut self) {
    if self.refresh.is_loading() {
      return;
    }
    debug!("starting background refresh");
    self.ctx.store.dispatch(Action::SetLoading(true));
    self.refresh.fetch();
    self.status = Some("refreshing...".to_string());
  }

  fn toggle_sort(&mut self) {
    self
      .ctx
      .store
      .update_preferences(|prefs| prefs.sort_order = prefs.sort_order.toggle());
    self.status = Some(format!("sorted {}", self.ctx.store.preferences().sort_order.label()));
  }

  fn execute_command(&mut self, cmd: &str) {
    debug!(cmd, "executing command");
    match cmd {
      "home" => self.show(None),
      "films" | "characters" | "planets" | "species" | "starships" | "vehicles" => {
        if let Ok(entity_type) = cmd.parse::<EntityType>() {
          self.show(Some(Box::new(EntityListView::new(entity_type))));
        }
      }
      "favorites" => self.show(Some(Box::new(FavoritesView::new()))),
      "search" => {
        self.show(None);
        self.view_stack[0].activate_search();
      }
      "refresh" => self.start_refresh(),
      "retry" => {
        self.ctx.store.retry_operation();
        self.start_refresh();
      }
      "clear-cache" => {
        self.ctx.client.clear_cache();
        self.ctx.store.clear_cache();
        // Back to bundled previews until the refresh lands
        self.ctx.store.hydrate();
        self.start_refresh();
      }
      "cache" => {
        let stats = self.ctx.client.cache_stats();
        self.status = Some(format!("{} cached responses", stats.size));
      }
      "sort" => self.toggle_sort(),
      "quit" => self.should_quit = true,
      "" => {}
      other => self.status = Some(format!("unknown command: {}", other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::preferences::SortOrder;
  use crate::testing::{key, stored_snapshot, view_context, view_context_with, FakeTransport, BASE_URL};
  use crate::storage::MemoryStore;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;
  use serde_json::json;
  use std::sync::Arc;

  fn command(app: &mut App, text: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  fn breadcrumb(app: &App) -> Vec<String> {
    app.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  #[tokio::test]
  async fn test_section_commands_replace_stack() {
    let mut app = App::new(view_context(), "test".to_string());

    command(&mut app, "planets");
    assert_eq!(breadcrumb(&app), ["Home", "Planets"]);

    command(&mut app, "people");
    assert_eq!(breadcrumb(&app), ["Home", "Characters"]);

    command(&mut app, "home");
    assert_eq!(breadcrumb(&app), ["Home"]);
  }

  #[tokio::test]
  async fn test_q_pops_then_quits() {
    let mut app = App::new(view_context(), "test".to_string());
    command(&mut app, "favorites");

    app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(breadcrumb(&app), ["Home"]);
    assert!(!app.should_quit);

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_s_toggles_sort() {
    let mut app = App::new(view_context(), "test".to_string());
    app.handle_key(key(KeyCode::Char('s')));
    assert_eq!(app.ctx.store.preferences().sort_order, SortOrder::Desc);
  }

  #[tokio::test]
  async fn test_unknown_command_sets_status() {
    let mut app = App::new(view_context(), "test".to_string());
    command(&mut app, "xyz");
    assert_eq!(app.status.as_deref(), Some("unknown command: xyz"));
  }

  #[tokio::test]
  async fn test_refresh_keeps_previews_when_unreachable() {
    let mut app = App::new(view_context(), "test".to_string());
    app.handle_key(key(KeyCode::Char('r')));
    assert!(app.ctx.store.state().loading);

    tokio::time::sleep(Duration::from_millis(200)).await;
    app.tick();

    let state = app.ctx.store.state();
    assert!(!state.loading);
    assert_eq!(state.lists.get(EntityType::People).len(), 6);
    assert!(state.error.is_some());
  }

  fn script_all_lists(transport: &FakeTransport) {
    for entity_type in EntityType::BROWSABLE {
      transport.respond(
        &format!("{}/{}", BASE_URL, entity_type.resource()),
        json!({"results": [{"uid": "1", "name": format!("Fresh {}", entity_type)}]}),
      );
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_start_with_fresh_snapshot_skips_network() {
    let transport = Arc::new(FakeTransport::new());
    script_all_lists(&transport);
    let ctx = view_context_with(stored_snapshot(5), transport.clone());
    let mut app = App::new(ctx, "test".to_string());

    assert_eq!(app.start(), LoadPlan::FromStorage);
    assert!(!app.refresh.is_loading());

    tokio::time::sleep(Duration::from_millis(500)).await;
    app.tick();

    assert!(transport.calls().is_empty());
    assert_eq!(app.ctx.store.state().lists.characters[0].name, "Stored Luke");
    assert_eq!(app.status.as_deref(), Some("using stored data"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_header_age_uses_store_clock() {
    let ctx = view_context_with(stored_snapshot(5), Arc::new(FakeTransport::new()));
    let mut app = App::new(ctx, "test".to_string());
    app.start();

    let mut terminal = Terminal::new(TestBackend::new(160, 10)).unwrap();
    terminal.draw(|frame| app.draw(frame)).unwrap();

    let buffer = terminal.backend().buffer();
    let header: String = (0..buffer.area.width)
      .map(|x| buffer[(x, 0)].symbol())
      .collect();
    assert!(header.contains("updated 5m ago"), "{}", header);
  }

  #[tokio::test(start_paused = true)]
  async fn test_start_with_stale_snapshot_refreshes() {
    let transport = Arc::new(FakeTransport::new());
    script_all_lists(&transport);
    let ctx = view_context_with(stored_snapshot(31), transport.clone());
    let mut app = App::new(ctx, "test".to_string());

    assert_eq!(app.start(), LoadPlan::NeedsRefresh);
    assert!(app.ctx.store.state().loading);

    tokio::time::sleep(Duration::from_millis(500)).await;
    app.tick();

    let state = app.ctx.store.state();
    assert_eq!(transport.calls().len(), 6);
    assert!(!state.loading);
    assert_eq!(state.lists.characters[0].name, "Fresh people");
    assert_eq!(state.last_fetch, Some(app.ctx.store.now()));
  }

  #[tokio::test]
  async fn test_start_without_snapshot_refreshes() {
    let ctx = view_context_with(MemoryStore::new(), Arc::new(FakeTransport::new()));
    let mut app = App::new(ctx, "test".to_string());
    assert_eq!(app.start(), LoadPlan::NeedsRefresh);
    assert!(app.refresh.is_loading());
  }

  #[tokio::test]
  async fn test_command_mode_shows_its_own_shortcuts() {
    let mut app = App::new(view_context(), "test".to_string());
    app.handle_key(key(KeyCode::Char(':')));
    assert!(app.command.is_active());
    app.handle_key(key(KeyCode::Esc));
    assert!(!app.command.is_active());
    assert_eq!(breadcrumb(&app), ["Home"]);
  }
}
