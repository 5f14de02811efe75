use crate::store::Store;
use crate::swapi::client::SwapiClient;
use crate::ui::components::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Shared state every view reads from and acts on
pub struct ViewContext {
  pub store: Store,
  pub client: SwapiClient,
}

/// Navigation requested by a view
pub enum ViewAction {
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views get first pick of every key. Keys they return as `NotHandled`
/// fall through to the app's global bindings (`:`, `r`, `s`, `q`).
///
/// Views that load data asynchronously should use Query<T> internally and
/// poll it in the tick() method.
pub trait View {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut ViewContext) -> KeyResult<ViewAction>;

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &ViewContext);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to allow views to poll async queries
  fn tick(&mut self, _ctx: &mut ViewContext) {}

  /// Open the view's search prompt, if it has one
  fn activate_search(&mut self) {}

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
