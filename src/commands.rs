/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "home",
    aliases: &["h"],
    description: "Overview of every section",
  },
  Command {
    name: "films",
    aliases: &["film", "movies"],
    description: "Browse films",
  },
  Command {
    name: "characters",
    aliases: &["c", "people", "person"],
    description: "Browse characters",
  },
  Command {
    name: "planets",
    aliases: &["p", "planet"],
    description: "Browse planets",
  },
  Command {
    name: "species",
    aliases: &["sp"],
    description: "Browse species",
  },
  Command {
    name: "starships",
    aliases: &["ships", "starship"],
    description: "Browse starships",
  },
  Command {
    name: "vehicles",
    aliases: &["v", "vehicle"],
    description: "Browse vehicles",
  },
  Command {
    name: "favorites",
    aliases: &["f", "fav", "favs"],
    description: "Saved favorites",
  },
  Command {
    name: "search",
    aliases: &["find"],
    description: "Search every loaded list",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Fetch all lists again",
  },
  Command {
    name: "retry",
    aliases: &[],
    description: "Clear the error and refresh",
  },
  Command {
    name: "clear-cache",
    aliases: &["reset"],
    description: "Drop cached responses and stored lists",
  },
  Command {
    name: "cache",
    aliases: &["stats"],
    description: "Show response cache size",
  },
  Command {
    name: "sort",
    aliases: &["order"],
    description: "Toggle name sort order",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit holocron",
  },
];

/// How well a command matches the input; lower is better
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  let aliases = || cmd.aliases.iter();

  if cmd.name == input {
    Some(0)
  } else if aliases().any(|a| *a == input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if aliases().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if aliases().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();

  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&'static Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input).map(|rank| (cmd, rank)))
    .collect();

  // Stable sort keeps declaration order within a rank
  matches.sort_by_key(|(_, rank)| *rank);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("planets");
    assert_eq!(suggestions[0].name, "planets");
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "p" is an alias of planets and a prefix of the "people" alias
    let suggestions = get_suggestions("p");
    assert_eq!(suggestions[0].name, "planets");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("people");
    assert_eq!(suggestions[0].name, "characters");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("star");
    assert_eq!(suggestions[0].name, "starships");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("cache");
    let names: Vec<_> = suggestions.iter().map(|c| c.name).collect();
    assert_eq!(names, ["cache", "clear-cache"]);
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("xyz").is_empty());
  }
}
