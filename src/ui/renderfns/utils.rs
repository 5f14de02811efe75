use crate::swapi::types::EntityType;
use chrono::{DateTime, Utc};
use ratatui::prelude::{Color, Rect};

/// Truncate to at most `max_len` characters, ending in "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    return s.to_string();
  }
  let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
  format!("{}...", kept)
}

/// Accent color for each kind of entity
pub fn type_color(entity_type: EntityType) -> Color {
  match entity_type {
    EntityType::Films => Color::Yellow,
    EntityType::People => Color::Cyan,
    EntityType::Planets => Color::Green,
    EntityType::Species => Color::Magenta,
    EntityType::Starships | EntityType::Transports => Color::LightBlue,
    EntityType::Vehicles => Color::LightRed,
  }
}

/// "just now", "12m ago", "3h ago", "2d ago"
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let age = now.signed_duration_since(then);
  if age.num_minutes() < 1 {
    "just now".to_string()
  } else if age.num_hours() < 1 {
    format!("{}m ago", age.num_minutes())
  } else if age.num_days() < 1 {
    format!("{}h ago", age.num_hours())
  } else {
    format!("{}d ago", age.num_days())
  }
}

/// Box for a prompt overlay in the top-left of `area`, clipped to it
pub fn overlay_area(area: Rect, height: u16) -> Rect {
  let width = (area.width * 60 / 100).clamp(30, 60).min(area.width.saturating_sub(2));
  let x = area.x + 1;
  let y = area.y + 1;
  let height = height.min(area.height.saturating_sub(1));
  Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("Hoth", 10), "Hoth");
    assert_eq!(truncate("Hoth", 4), "Hoth");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("Millennium Falcon", 10), "Millenn...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Padmé Amidala", 8), "Padmé...");
  }

  #[test]
  fn test_relative_age() {
    let now = Utc::now();
    assert_eq!(relative_age(now - Duration::seconds(20), now), "just now");
    assert_eq!(relative_age(now - Duration::minutes(12), now), "12m ago");
    assert_eq!(relative_age(now - Duration::hours(3), now), "3h ago");
    assert_eq!(relative_age(now - Duration::days(2), now), "2d ago");
  }

  #[test]
  fn test_overlay_fits_small_area() {
    let area = Rect::new(0, 0, 20, 3);
    let overlay = overlay_area(area, 10);
    assert!(overlay.width <= 18);
    assert_eq!(overlay.height, 2);
  }
}
