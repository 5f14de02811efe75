pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use ratatui::widgets::ListState;

/// Keep the selection inside `0..len`, selecting the first row when
/// nothing is selected and clearing it for an empty list.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
    None => state.select(Some(0)),
  }
}

/// Move the selection by `delta` rows, clamped to the list
pub fn move_selection(state: &mut ListState, len: usize, delta: isize) {
  if len == 0 {
    state.select(None);
    return;
  }
  let current = state.selected().unwrap_or(0) as isize;
  let next = (current + delta).clamp(0, len as isize - 1);
  state.select(Some(next as usize));
}
