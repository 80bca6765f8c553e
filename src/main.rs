use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskflow::api::{self, middleware::ServerConfig};
use taskflow::store::{self, Store};

/// How long in-flight requests may drain after a shutdown signal before the
/// process force-exits.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "Multi-project task tracking with sprints and kanban boards")]
struct Cli {
    /// Path to the JSON data slot (defaults to the platform data directory)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TaskFlow API server
    Serve {
        /// Port for the HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Host interface to bind
        #[arg(long)]
        host: Option<String>,
    },
    /// Write all projects, tasks, sprints, and users to a JSON file
    Export { file: PathBuf },
    /// Load records from an export file, assigning fresh identifiers
    Import { file: PathBuf },
}

/// Initialize tracing to stdout, or to a rolling file when a log directory
/// is configured. The returned guard must stay alive for the file writer to
/// flush.
fn init_tracing(log_dir: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "taskflow=debug,tower_http=debug".into()),
    );

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "taskflow.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::from_env();
    let _log_guard = init_tracing(config.log_dir.as_deref());

    let slot = match cli.data.or_else(|| config.data_path.clone()) {
        Some(path) => path,
        None => store::default_slot_path()?,
    };

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        host: None,
    }) {
        Commands::Serve { port, host } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            serve(slot, config).await?;
        }
        Commands::Export { file } => {
            let store = Store::open(&slot);
            let doc = store.export();
            let json = serde_json::to_string_pretty(&doc)?;
            std::fs::write(&file, json)
                .with_context(|| format!("failed to write {}", file.display()))?;
            println!(
                "Exported {} projects, {} tasks, {} sprints, {} users to {}",
                doc.projects.len(),
                doc.tasks.len(),
                doc.sprints.len(),
                doc.users.len(),
                file.display()
            );
        }
        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let doc = store::parse_export(&raw)
                .context("import aborted; existing data is untouched")?;
            let store = Store::open(&slot);
            let summary = store.import(doc);
            println!(
                "Imported {} projects, {} tasks, {} sprints, {} users",
                summary.projects, summary.tasks, summary.sprints, summary.users
            );
        }
    }

    Ok(())
}

async fn serve(slot: PathBuf, config: ServerConfig) -> anyhow::Result<()> {
    let store = Store::open(&slot);
    tracing::info!("store slot: {}", slot.display());

    let addr = format!("{}:{}", config.host, config.port);
    let app = api::create_router_with_config(store, config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("TaskFlow API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolves on SIGINT/SIGTERM. Once a signal lands, in-flight requests get a
/// bounded drain window; a watchdog force-exits if the drain hangs.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        tracing::error!("graceful shutdown timed out after {:?}, forcing exit", SHUTDOWN_GRACE);
        std::process::exit(1);
    });
}
