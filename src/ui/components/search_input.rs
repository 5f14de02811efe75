use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::renderfns::overlay_area;
use crate::ui::view::ShortcutInfo;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Query changed (on each keystroke, empty string on cancel)
  Changed(String),
  /// Prompt closed with Enter; the query stays applied
  Submitted(String),
}

/// `/` prompt. The query outlives the prompt so views can keep filtering
/// after it closes.
#[derive(Debug, Clone)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
  title: &'static str,
}

impl SearchInput {
  pub fn new(title: &'static str) -> Self {
    Self {
      input: TextInput::new(),
      active: false,
      title,
    }
  }

  /// Check if the search prompt is open
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Get the current query
  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Open the prompt, keeping the current query for editing
  pub fn activate(&mut self) {
    self.active = true;
  }

  /// Close the prompt and drop the query
  pub fn reset(&mut self) {
    self.active = false;
    self.input.clear();
  }

  /// Handle a key event. Call this regardless of active state; it handles
  /// activation too.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(query) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted(query))
      }
      InputResult::Cancelled => {
        self.reset();
        KeyResult::Event(SearchEvent::Changed(String::new()))
      }
      InputResult::Consumed => KeyResult::Event(SearchEvent::Changed(self.query().to_string())),
      // Swallow everything else so view bindings don't fire mid-typing
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Hints for the header while the prompt is open
  pub fn prompt_shortcuts() -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Enter", "apply").with_priority(10),
      ShortcutInfo::new("Esc", "clear").with_priority(90),
    ]
  }

  /// Render the prompt overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let overlay = overlay_area(area, 3);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    if inner.height == 0 {
      return;
    }

    let input_line = self.input.line("/");
    frame.render_widget(Paragraph::new(input_line), inner);
  }
}
