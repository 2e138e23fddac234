mod app;
mod config;
mod db;
mod error;
mod event;
mod github;
mod logging;
mod paging;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

const FALLBACK_QUERY: &str = "Android";

#[derive(Parser, Debug)]
#[command(name = "ghscroll")]
#[command(about = "Scroll through GitHub repository search results, cached locally")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/ghscroll/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Search query to start with
  query: Option<String>,

  /// Repositories requested per page
  #[arg(long)]
  page_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override paging if specified on command line
  if let Some(page_size) = args.page_size {
    config.paging.page_size = page_size;
    config.validate()?;
  }

  let _log_guard = logging::init(&config.log)?;

  let query = args
    .query
    .or_else(|| config.default_query.clone())
    .unwrap_or_else(|| FALLBACK_QUERY.to_string());
  info!(%query, page_size = config.paging.page_size, "starting");

  // Initialize and run the app
  let mut app = app::App::new(&config, &query)?;
  app.run().await?;

  Ok(())
}
