//! qabot binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Open the SQLite question store
//! 3. Spawn the pending action store
//! 4. Route JSON updates from stdin until EOF or Ctrl-C
//! 5. Drain in-flight updates and stop the pending store

mod cli;
mod console;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use qabot_action::{EventRouter, PendingStore, Update};
use qabot_core::config::QabotConfig;
use qabot_storage::SqliteQaStore;

use crate::cli::CliArgs;
use crate::console::ConsoleMessenger;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config_file = args.resolve_config_path();
    let config = QabotConfig::load_or_default(&config_file);

    // Tracing goes to stderr; stdout carries outbound calls.
    let level = args.resolve_log_level(&config.general.log_level).to_string();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    tracing::info!("Starting qabot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let db_path = args.resolve_db_path(&config.general.data_dir);
    let store = match SqliteQaStore::open(&db_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "Failed to open database");
            return Err(e.into());
        }
    };
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let pending = Arc::new(PendingStore::spawn(config.pending.clone()));

    let messenger = Arc::new(ConsoleMessenger::new(std::io::stdout()));
    let router = Arc::new(EventRouter::new(
        &config,
        Arc::clone(&pending),
        store,
        messenger,
    ));

    // === Update loop ===

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Update>(&line) {
                        Ok(update) => {
                            let router = Arc::clone(&router);
                            in_flight.spawn(async move {
                                let category = router.handle(update).await;
                                tracing::debug!(category = ?category, "Update handled");
                            });
                        }
                        Err(e) => tracing::warn!(error = %e, "Skipping unparseable update"),
                    }
                }
                Ok(None) => {
                    tracing::info!("Input closed");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read input");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }

        while let Some(done) = in_flight.try_join_next() {
            if let Err(e) = done {
                tracing::warn!(error = %e, "Update task failed");
            }
        }
    }

    // === Shutdown ===

    while let Some(done) = in_flight.join_next().await {
        if let Err(e) = done {
            tracing::warn!(error = %e, "Update task failed");
        }
    }
    pending.shutdown().await;
    tracing::info!("qabot stopped");

    Ok(())
}
