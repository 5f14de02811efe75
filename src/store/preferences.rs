use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Asc,
  Desc,
}

impl SortOrder {
  pub fn toggle(self) -> Self {
    match self {
      SortOrder::Asc => SortOrder::Desc,
      SortOrder::Desc => SortOrder::Asc,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      SortOrder::Asc => "A-Z",
      SortOrder::Desc => "Z-A",
    }
  }
}

/// Persisted user preferences. Unknown or missing fields fall back to
/// defaults so older stored values keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
  pub theme: String,
  /// Names previewed per home section, and the page step in lists
  pub items_per_page: usize,
  pub sort_order: SortOrder,
  pub show_descriptions: bool,
  pub auto_play: bool,
}

impl Default for Preferences {
  fn default() -> Self {
    Self {
      theme: "dark".to_string(),
      items_per_page: 12,
      sort_order: SortOrder::Asc,
      show_descriptions: true,
      auto_play: false,
    }
  }
}
