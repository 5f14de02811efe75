//! Headless subcommands and the wiring shared with the TUI.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::backend::api_types::{
  BackendUser, Page, ProfileUpdate, UserUpdate, DEFAULT_LIMIT, DEFAULT_PAGE,
};
use crate::backend::{BackendClient, NewFavorite, Pagination, Registration, ResourceKind};
use crate::cache::RequestQueue;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::connectivity::ConnectivityFlag;
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use crate::store::Store;
use crate::swapi::client::SwapiClient;
use crate::swapi::transport::HttpTransport;
use crate::swapi::types::EntityType;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Print a type's preview list, or one entity, as JSON
  Fetch {
    entity_type: EntityType,
    id: Option<String>,
  },
  /// Search character names
  Search { query: String },
  /// Check that the content API answers and show the response cache
  Status,
  /// List stored favorites
  Favorites {
    /// Only show favorites of this type
    #[arg(long = "type")]
    entity_type: Option<EntityType>,
    /// Remove every stored favorite
    #[arg(long, conflicts_with = "entity_type")]
    clear: bool,
  },
  /// Talk to the holocron backend
  Backend {
    #[command(subcommand)]
    command: BackendCommand,
  },
}

#[derive(Subcommand, Debug)]
pub enum BackendCommand {
  Health,
  /// Create an account (password from HOLOCRON_BACKEND_PASSWORD)
  Register {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
  },
  /// Log in and print a token for HOLOCRON_BACKEND_TOKEN
  Login {
    #[arg(long)]
    email: String,
  },
  Logout,
  Me,
  /// Change your own name or avatar
  UpdateMe {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    avatar: Option<String>,
  },
  /// Current password from HOLOCRON_BACKEND_PASSWORD, new one from
  /// HOLOCRON_BACKEND_NEW_PASSWORD
  ChangePassword,
  List {
    resource: ResourceKind,
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    page: u32,
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,
  },
  Search {
    resource: ResourceKind,
    query: String,
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    page: u32,
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,
  },
  Get {
    resource: ResourceKind,
    id: String,
    /// Look up by content uid instead of backend id
    #[arg(long)]
    uid: bool,
  },
  /// Create a record from a JSON object
  Create { resource: ResourceKind, json: String },
  /// Update a record with a JSON object of changed fields
  Update {
    resource: ResourceKind,
    id: String,
    json: String,
  },
  Delete { resource: ResourceKind, id: String },
  /// Server-side favorites of the logged-in user
  Favorites {
    #[command(subcommand)]
    action: Option<FavoriteAction>,
  },
  /// Account administration (admin token required)
  Users {
    #[command(subcommand)]
    action: UserAction,
  },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
  List {
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    page: u32,
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,
  },
  Get { id: String },
  Update {
    id: String,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    role: Option<String>,
    /// Reactivate (true) or deactivate (false)
    #[arg(long)]
    active: Option<bool>,
  },
  /// Deactivate an account
  Delete { id: String },
  Stats,
}

#[derive(Subcommand, Debug)]
pub enum FavoriteAction {
  List {
    #[arg(long = "type")]
    entity_type: Option<EntityType>,
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    page: u32,
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,
  },
  /// Fetch an entity from the content API and save it
  Add { entity_type: EntityType, uid: String },
  /// Remove by type and uid, or by favorite id with --id
  Remove {
    #[arg(required_unless_present = "id", requires = "uid")]
    entity_type: Option<EntityType>,
    uid: Option<String>,
    #[arg(long, conflicts_with_all = ["entity_type", "uid"])]
    id: Option<String>,
  },
  Check { entity_type: EntityType, uid: String },
  Clear,
}

/// Content client and state store, wired the same way for every entry
/// point.
pub fn build_services(config: &Config, ephemeral: bool) -> Result<(Store, SwapiClient)> {
  let clock: Arc<dyn Clock> = Arc::new(SystemClock);
  let connectivity = ConnectivityFlag::default();
  let transport = Arc::new(HttpTransport::new()?);

  let queue = RequestQueue::new(
    transport,
    clock.clone(),
    connectivity.clone(),
    config.api.queue_settings()?,
  );
  let client = SwapiClient::new(queue, &config.api.base_url, config.api.preview_limit);

  let quota = config.storage.quota_bytes;
  let storage: Box<dyn KeyValueStore> = if ephemeral {
    Box::new(MemoryStore::with_quota(quota))
  } else {
    Box::new(SqliteStore::open(config.storage.path.as_deref(), quota)?)
  };

  let store = Store::new(storage, clock, Arc::new(connectivity), config.api.freshness()?);
  Ok((store, client))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn parse_object(json: &str) -> Result<Value> {
  let value: Value = serde_json::from_str(json).map_err(|e| eyre!("Invalid JSON: {}", e))?;
  if !value.is_object() {
    return Err(eyre!("Expected a JSON object"));
  }
  Ok(value)
}

fn print_user(user: &BackendUser) {
  let inactive = if user.is_active == Some(false) { " (inactive)" } else { "" };
  println!(
    "{:<36} {} <{}> {}{}",
    user.id,
    user.username,
    user.email,
    user.role.as_deref().unwrap_or_default(),
    inactive
  );
}

fn print_page_footer<T>(page: &Page<T>) {
  println!(
    "-- page {}/{} ({} total)",
    page.pagination.page, page.pagination.total_pages, page.pagination.total
  );
}

pub async fn run(command: Command, config: &Config, ephemeral: bool) -> Result<()> {
  match command {
    Command::Fetch { entity_type, id } => {
      let (_, client) = build_services(config, ephemeral)?;
      match id {
        Some(id) => {
          let entity = client
            .fetch_entity_details(entity_type, &id)
            .await
            .ok_or_else(|| eyre!("No {} with id {}", entity_type.resource(), id))?;
          print_json(&entity)
        }
        None => {
          let entities = match entity_type {
            EntityType::Films => client.fetch_films().await,
            EntityType::People => client.fetch_characters().await,
            EntityType::Planets => client.fetch_planets().await,
            EntityType::Species => client.fetch_species().await,
            EntityType::Starships => client.fetch_starships().await,
            EntityType::Vehicles => client.fetch_vehicles().await,
            EntityType::Transports => client.fetch_list(entity_type).await,
          };
          print_json(&entities)
        }
      }
    }
    Command::Search { query } => {
      let (_, client) = build_services(config, ephemeral)?;
      print_json(&client.search_characters(&query).await)
    }
    Command::Status => {
      let (_, client) = build_services(config, ephemeral)?;
      let reachable = client.check_api_health().await;
      println!(
        "{} {}",
        client.base_url(),
        if reachable { "reachable" } else { "unreachable" }
      );
      let stats = client.cache_stats();
      println!("{} cached responses", stats.size);
      for key in stats.keys {
        println!("  {}", key);
      }
      Ok(())
    }
    Command::Favorites { entity_type, clear } => {
      let (mut store, _) = build_services(config, ephemeral)?;
      let count = store.restore_favorites().len();
      if clear {
        store.clear_favorites();
        println!("removed {} favorites", count);
        return Ok(());
      }
      let shown = match entity_type {
        Some(entity_type) => store.favorites_by_type(entity_type),
        None => store.state().favorites.iter().collect(),
      };
      for entity in shown {
        println!("{:<12} {:<6} {}", entity.entity_type.display_name(), entity.uid, entity.name);
      }
      Ok(())
    }
    Command::Backend { command } => run_backend(command, config, ephemeral).await,
  }
}

async fn run_backend(command: BackendCommand, config: &Config, ephemeral: bool) -> Result<()> {
  let mut backend = BackendClient::new(&config.backend.url)?;
  if let Some(token) = Config::backend_token() {
    backend = backend.with_token(token);
  }

  match command {
    BackendCommand::Health => {
      let health = backend.health().await?;
      println!("{} {}", health.status, health.message.unwrap_or_default());
    }
    BackendCommand::Register { username, email } => {
      let registration = Registration {
        username,
        email,
        password: Config::backend_password()?,
        first_name: None,
        last_name: None,
      };
      let user = backend.register(&registration).await?;
      println!("registered {} <{}>", user.username, user.email);
      print_token(&backend);
    }
    BackendCommand::Login { email } => {
      let user = backend.login(&email, &Config::backend_password()?).await?;
      println!("logged in as {} <{}>", user.username, user.email);
      print_token(&backend);
    }
    BackendCommand::Logout => {
      backend.logout().await?;
      println!("logged out");
    }
    BackendCommand::Me => print_user(&backend.me().await?),
    BackendCommand::UpdateMe {
      first_name,
      last_name,
      avatar,
    } => {
      let changes = ProfileUpdate {
        first_name,
        last_name,
        avatar,
      };
      if changes == ProfileUpdate::default() {
        return Err(eyre!("Nothing to update"));
      }
      print_user(&backend.update_me(&changes).await?);
    }
    BackendCommand::ChangePassword => {
      let current = Config::backend_password()?;
      let new = Config::backend_new_password()?;
      backend.change_password(&current, &new).await?;
      println!("password changed");
    }
    BackendCommand::List {
      resource,
      page,
      limit,
    } => {
      let page = backend
        .resource(resource)
        .list(Pagination::new(page, limit))
        .await?;
      print_json(&page.items)?;
      print_page_footer(&page);
    }
    BackendCommand::Search {
      resource,
      query,
      page,
      limit,
    } => {
      let page = backend
        .resource(resource)
        .search(&query, Pagination::new(page, limit))
        .await?;
      print_json(&page.items)?;
      print_page_footer(&page);
    }
    BackendCommand::Get { resource, id, uid } => {
      let api = backend.resource(resource);
      let record = if uid {
        api.get_by_uid(&id).await?
      } else {
        api.get(&id).await?
      };
      print_json(&record.into_entity(resource))?;
    }
    BackendCommand::Create { resource, json } => {
      let record = backend.resource(resource).create(&parse_object(&json)?).await?;
      print_json(&record)?;
    }
    BackendCommand::Update { resource, id, json } => {
      let record = backend
        .resource(resource)
        .update(&id, &parse_object(&json)?)
        .await?;
      print_json(&record)?;
    }
    BackendCommand::Delete { resource, id } => {
      backend.resource(resource).delete(&id).await?;
      println!("deleted {} {}", resource.singular(), id);
    }
    BackendCommand::Favorites { action } => {
      let action = action.unwrap_or(FavoriteAction::List {
        entity_type: None,
        page: DEFAULT_PAGE,
        limit: DEFAULT_LIMIT,
      });
      run_favorites(&backend, action, config, ephemeral).await?;
    }
    BackendCommand::Users { action } => run_users(&backend, action).await?,
  }
  Ok(())
}

async fn run_users(backend: &BackendClient, action: UserAction) -> Result<()> {
  let users = backend.users();
  match action {
    UserAction::List { page, limit } => {
      let page = users.list(Pagination::new(page, limit)).await?;
      for user in &page.items {
        print_user(user);
      }
      print_page_footer(&page);
    }
    UserAction::Get { id } => print_user(&users.get(&id).await?),
    UserAction::Update {
      id,
      username,
      email,
      first_name,
      last_name,
      role,
      active,
    } => {
      let changes = UserUpdate {
        username,
        email,
        first_name,
        last_name,
        role,
        is_active: active,
      };
      if changes == UserUpdate::default() {
        return Err(eyre!("Nothing to update"));
      }
      print_user(&users.update(&id, &changes).await?);
    }
    UserAction::Delete { id } => {
      users.delete(&id).await?;
      println!("deactivated user {}", id);
    }
    UserAction::Stats => print_json(&users.stats().await?)?,
  }
  Ok(())
}

async fn run_favorites(
  backend: &BackendClient,
  action: FavoriteAction,
  config: &Config,
  ephemeral: bool,
) -> Result<()> {
  let favorites = backend.favorites();
  match action {
    FavoriteAction::List {
      entity_type,
      page,
      limit,
    } => {
      let pagination = Pagination::new(page, limit);
      let page = match entity_type {
        Some(entity_type) => favorites.list_by_type(entity_type, pagination).await?,
        None => favorites.list(pagination).await?,
      };
      for favorite in &page.items {
        println!(
          "{:<12} {:<6} {}",
          favorite.entity_type.display_name(),
          favorite.entity_uid,
          favorite.entity_name
        );
      }
      print_page_footer(&page);
    }
    FavoriteAction::Add { entity_type, uid } => {
      let (_, client) = build_services(config, ephemeral)?;
      let entity = client
        .fetch_entity_details(entity_type, &uid)
        .await
        .ok_or_else(|| eyre!("No {} with id {}", entity_type.resource(), uid))?;
      let saved = favorites.add(&NewFavorite::from_entity(&entity)).await?;
      println!("saved {} ({})", saved.entity_name, saved.id);
    }
    FavoriteAction::Remove {
      entity_type,
      uid,
      id,
    } => match (id, entity_type, uid) {
      (Some(id), _, _) => {
        favorites.remove(&id).await?;
        println!("removed favorite {}", id);
      }
      (None, Some(entity_type), Some(uid)) => {
        favorites.remove_entity(entity_type, &uid).await?;
        println!("removed {} {}", entity_type.resource(), uid);
      }
      _ => return Err(eyre!("Give a type and uid, or --id")),
    },
    FavoriteAction::Check { entity_type, uid } => {
      let check = favorites.check(entity_type, &uid).await?;
      println!("{}", if check.is_favorite { "favorite" } else { "not a favorite" });
    }
    FavoriteAction::Clear => {
      favorites.clear().await?;
      println!("cleared favorites");
    }
  }
  Ok(())
}

fn print_token(backend: &BackendClient) {
  if let Some(token) = backend.token() {
    println!("export HOLOCRON_BACKEND_TOKEN={}", token);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[derive(Parser, Debug)]
  struct TestArgs {
    #[command(subcommand)]
    command: Command,
  }

  #[test]
  fn test_parse_fetch_with_alias() {
    let args = TestArgs::try_parse_from(["holocron", "fetch", "characters", "1"]).unwrap();
    match args.command {
      Command::Fetch { entity_type, id } => {
        assert_eq!(entity_type, EntityType::People);
        assert_eq!(id.as_deref(), Some("1"));
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn test_parse_backend_list() {
    let args =
      TestArgs::try_parse_from(["holocron", "backend", "list", "planets", "--page", "2"]).unwrap();
    match args.command {
      Command::Backend {
        command: BackendCommand::List {
          resource,
          page,
          limit,
        },
      } => {
        assert_eq!(resource, ResourceKind::Planets);
        assert_eq!(page, 2);
        assert_eq!(limit, DEFAULT_LIMIT);
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn test_backend_rejects_unserved_resource() {
    assert!(TestArgs::try_parse_from(["holocron", "backend", "list", "films"]).is_err());
  }

  #[test]
  fn test_parse_favorite_remove_forms() {
    let args = TestArgs::try_parse_from([
      "holocron", "backend", "favorites", "remove", "starships", "10",
    ])
    .unwrap();
    match args.command {
      Command::Backend {
        command:
          BackendCommand::Favorites {
            action: Some(FavoriteAction::Remove { entity_type, uid, id }),
          },
      } => {
        assert_eq!(entity_type, Some(EntityType::Starships));
        assert_eq!(uid.as_deref(), Some("10"));
        assert_eq!(id, None);
      }
      other => panic!("unexpected {:?}", other),
    }

    let args =
      TestArgs::try_parse_from(["holocron", "backend", "favorites", "remove", "--id", "f1"])
        .unwrap();
    match args.command {
      Command::Backend {
        command:
          BackendCommand::Favorites {
            action: Some(FavoriteAction::Remove { entity_type, id, .. }),
          },
      } => {
        assert_eq!(entity_type, None);
        assert_eq!(id.as_deref(), Some("f1"));
      }
      other => panic!("unexpected {:?}", other),
    }

    assert!(TestArgs::try_parse_from(["holocron", "backend", "favorites", "remove"]).is_err());
    assert!(TestArgs::try_parse_from([
      "holocron", "backend", "favorites", "remove", "people", "1", "--id", "f1",
    ])
    .is_err());
  }

  #[test]
  fn test_parse_users_update() {
    let args = TestArgs::try_parse_from([
      "holocron", "backend", "users", "update", "u1", "--role", "admin", "--active", "false",
    ])
    .unwrap();
    match args.command {
      Command::Backend {
        command:
          BackendCommand::Users {
            action: UserAction::Update { id, role, active, email, .. },
          },
      } => {
        assert_eq!(id, "u1");
        assert_eq!(role.as_deref(), Some("admin"));
        assert_eq!(active, Some(false));
        assert_eq!(email, None);
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn test_parse_account_commands() {
    for argv in [
      vec!["holocron", "backend", "users", "stats"],
      vec!["holocron", "backend", "users", "delete", "u1"],
      vec!["holocron", "backend", "users", "list", "--limit", "5"],
      vec!["holocron", "backend", "change-password"],
      vec!["holocron", "backend", "update-me", "--first-name", "Leia"],
      vec!["holocron", "favorites", "--type", "planets"],
    ] {
      assert!(TestArgs::try_parse_from(argv.clone()).is_ok(), "{:?}", argv);
    }
    assert!(TestArgs::try_parse_from(["holocron", "favorites", "--type", "planets", "--clear"]).is_err());
  }

  #[test]
  fn test_parse_object_requires_object() {
    assert!(parse_object(r#"{"name": "Hoth"}"#).is_ok());
    assert!(parse_object("[1, 2]").is_err());
    assert!(parse_object("not json").is_err());
  }
}
