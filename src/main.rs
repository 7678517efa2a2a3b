//! Health metrics API entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use health_metrics_api::api::{create_router, AppState};
use health_metrics_api::config::Config;
use health_metrics_api::metrics;
use health_metrics_api::store::{HealthStore, MemoryStore, PgStore};
use health_metrics_api::utils::shutdown_signal;
use health_metrics_api::AppError;

/// Health metrics CRUD API.
#[derive(Parser, Debug)]
#[command(name = "health-metrics-api")]
#[command(about = "Per-user health metrics API keyed by phone number")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load().map_err(AppError::from)?;
    config.verbose |= args.verbose;

    init_logging(&config);

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Serve { port }) => cmd_serve(config, port.or(args.port)).await,
        None => cmd_serve(config, args.port).await,
    }
}

fn init_logging(config: &Config) {
    let filter = if config.verbose {
        EnvFilter::new("health_metrics_api=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    if config.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("HEALTH METRICS API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(AppError::InvalidConfig(e).into());
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Bind Address: {}", config.bind_addr());
    println!(
        "  Store: {}",
        if config.uses_database() { "PostgreSQL" } else { "in-memory" }
    );
    println!("  Pool Size: {}", config.db_max_connections);
    println!("  Log Level: {}", config.rust_log);
    println!("  JSON Logs: {}", config.log_json);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP server until shutdown.
async fn cmd_serve(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.port = port;
    }
    config.validate().map_err(AppError::InvalidConfig)?;

    let (store, store_kind): (Arc<dyn HealthStore>, &'static str) = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.db_max_connections)
                .await
                .map_err(AppError::from)?;
            (Arc::new(store), "postgres")
        }
        None => {
            warn!("DATABASE_URL not set, records are kept in memory only");
            (Arc::new(MemoryStore::new()), "memory")
        }
    };

    let mut state = AppState::new(store, store_kind);
    match metrics::install_recorder() {
        Ok(handle) => {
            metrics::init_metrics();
            state = state.with_prometheus(handle);
        }
        Err(e) => warn!("Prometheus recorder not installed: {}", e),
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await.map_err(AppError::from)?;
    info!("Health metrics API listening on {} (store: {})", addr, store_kind);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::from)?;

    info!("Server stopped");
    Ok(())
}
