//! dorm-server binary.
//!
//! Reads configuration from the environment, optionally layered over a TOML
//! file given with `--config`, opens the SQLite store, and serves the admin
//! pages and JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To produce an argon2 PHC string usable as `ADMIN_PASSWORD` or in
//! `ADMIN_USERS`:
//!
//! ```
//! cargo run -p dorm-web --bin dorm-server -- hash-password
//! ```

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dorm_core::{
  cleanup::{CleanupJob, CleanupTrigger},
  resident::NewResident,
  store::DormStore,
};
use dorm_store_sqlite::SqliteStore;
use dorm_web::{AppState, ServerConfig, scheduler};
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Dormitory resident administration server")]
struct Cli {
  /// Optional TOML configuration file; environment variables take precedence.
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve HTTP (default).
  Serve,
  /// Run the automatic cleanup if the weekly window is open.
  Cleanup {
    /// Run even outside the window.
    #[arg(long)]
    force: bool,
  },
  /// Register a resident.
  AddResident {
    #[arg(long)]
    name: String,
    #[arg(long)]
    room: String,
  },
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
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
  let command = cli.command.unwrap_or(Command::Serve);

  if let Command::HashPassword = command {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let config = ServerConfig::load(cli.config.as_deref()).context("invalid configuration")?;
  if config.uses_dev_secret() {
    tracing::warn!("SECRET_KEY is not set; using the development key");
  }

  let location = config.database_location()?;
  let store = SqliteStore::open_location(&location)
    .await
    .with_context(|| format!("failed to open database {}", config.database_url))?;
  let store = Arc::new(store);

  let residents = store.count_residents().await?;
  tracing::info!(database = %config.database_url, residents, "database ready");

  match command {
    Command::Serve => serve(store, config).await,
    Command::Cleanup { force } => {
      let job = CleanupJob::new(store, config.cleanup_schedule()?);
      let now = Utc::now();
      let result = if force {
        Some(job.run(now, CleanupTrigger::Automatic).await?)
      } else {
        job.run_scheduled(now).await?
      };
      match result {
        Some(r) => println!("{}: {} residents deleted", r.status, r.deleted),
        None => println!("cleanup not due; nothing done"),
      }
      Ok(())
    }
    Command::AddResident { name, room } => {
      let resident = store.add_resident(NewResident::new(name, room)).await?;
      println!("added resident {} in room {}", resident.id, resident.room_number);
      Ok(())
    }
    Command::HashPassword => Ok(()),
  }
}

async fn serve(store: Arc<SqliteStore>, config: ServerConfig) -> anyhow::Result<()> {
  let address = config.address();
  let state = AppState::from_config(store, config)?;
  tracing::info!(accounts = state.credentials.len(), "credentials loaded");

  let timer = scheduler::spawn(state.cleanup.clone());
  let app = dorm_web::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  let served = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error");
  timer.abort();
  served
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\r', '\n']).to_string();
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
}
