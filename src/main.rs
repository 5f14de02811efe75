mod app;
mod backend;
mod cache;
mod cli;
mod clock;
mod commands;
mod config;
mod connectivity;
mod event;
mod logging;
mod query;
mod storage;
mod store;
mod swapi;
#[cfg(test)]
mod testing;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "holocron")]
#[command(about = "A terminal browser for Star Wars API content")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/holocron/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Keep favorites and cached lists in memory only
  #[arg(long, global = true)]
  ephemeral: bool,

  #[command(subcommand)]
  command: Option<cli::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  match args.command {
    Some(command) => {
      logging::init_stderr()?;
      let config = config::Config::load(args.config.as_deref())?;
      cli::run(command, &config, args.ephemeral).await
    }
    None => {
      // The TUI owns the terminal, so logs go to a file
      let _guard = logging::init_file()?;
      let config = config::Config::load(args.config.as_deref())?;
      let (store, client) = cli::build_services(&config, args.ephemeral)?;

      let ctx = ui::view::ViewContext { store, client };
      let mut app = app::App::new(ctx, config.title());
      app.run().await
    }
  }
}
