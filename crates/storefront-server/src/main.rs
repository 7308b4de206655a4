//! storefront server binary.
//!
//! Reads `storefront.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the JSON API over HTTP.
//!
//! # Seeding the catalog
//!
//! ```
//! cargo run -p storefront-server -- seed seed/products.json
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use storefront_server::{ServerConfig, read_seed_file, router, seed};
use storefront_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Storefront catalog and cart API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "storefront.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (default).
  Serve,
  /// Insert the products listed in a JSON file and exit.
  Seed {
    /// JSON array of products.
    file: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store = SqliteStore::open(&server_cfg.database_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", server_cfg.database_path)
    })?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Seed { file } => {
      let products = read_seed_file(&file)?;
      let inserted = seed(&store, products).await?;
      tracing::info!(count = inserted.len(), "catalog seeded");
      Ok(())
    }
    Command::Serve => serve(server_cfg, store).await,
  }
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let state = server_cfg
    .api_state(Arc::new(store))
    .context("invalid configuration")?;
  let cors = server_cfg.cors_layer().context("invalid configuration")?;

  let app = router(state, cors);
  let address = server_cfg.address();

  tracing::info!(
    tax_percentage = %server_cfg.tax_percentage,
    database = %server_cfg.database_path,
    cors_origin = %server_cfg.cors_origin,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
