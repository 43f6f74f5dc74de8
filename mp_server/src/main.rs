//! Knockout tournament server.
//!
//! Serves the tournament HTTP API on top of a PostgreSQL or in-memory bracket
//! store and closes expired check-ins in the background.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use log::info;
use matchplay::TournamentController;
use matchplay::db::{BracketStore, Database, MemoryBracketStore, PgBracketStore};
use matchplay::services::{LogNotifier, LogPrizeService};
use mp_server::api::{self, AppState};
use mp_server::config::{ServerConfig, StoreBackend};
use mp_server::jobs::CheckInSweeper;
use mp_server::notifier::ObservedNotifier;
use mp_server::{logging, metrics};
use pico_args::Arguments;
use tokio::sync::watch;

const HELP: &str = "\
Run the matchplay tournament server

USAGE:
  mp_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --backend    NAME        memory or postgres          [default: env STORE_BACKEND or postgres]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  STORE_BACKEND            Storage backend (memory, postgres)
  DATABASE_URL             PostgreSQL connection string
  DB_RUN_MIGRATIONS        Apply migrations on startup (default: true)
  METRICS_BIND             Prometheus exporter address, disabled when unset
  CHECK_IN_SWEEP_SECS      Expired check-in sweep interval (default: 30)
  RUST_LOG                 Log filter (default: info,sqlx=warn,hyper=warn)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    backend: Option<StoreBackend>,
}

fn parse_backend(value: &str) -> Result<StoreBackend, String> {
    StoreBackend::parse(value).ok_or_else(|| format!("unknown backend '{value}'"))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        backend: pargs.opt_value_from_fn("--backend", parse_backend)?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.backend)?;
    config.validate()?;
    info!("Starting tournament server at {}", config.bind);

    let store: Arc<dyn BracketStore> = match &config.database {
        Some(db_config) => {
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            if db_config.run_migrations {
                db.migrate().await.context("Failed to run migrations")?;
            }
            info!("Database connected successfully");
            Arc::new(PgBracketStore::new(Arc::new(db.pool().clone())))
        }
        None => {
            log::warn!("Using in-memory store, tournaments are lost on restart");
            Arc::new(MemoryBracketStore::new())
        }
    };

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics at http://{}/metrics", addr);
    }

    let notifier = Arc::new(ObservedNotifier::new(Arc::new(LogNotifier)));
    let controller = TournamentController::new(store, notifier, Arc::new(LogPrizeService::new()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = CheckInSweeper::new(controller.clone(), config.check_in_sweep);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx));

    let app = api::create_router(AppState { controller });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_handle.await {
        log::error!("Check-in sweeper ended abnormally: {}", e);
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
