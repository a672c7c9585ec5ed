//! # medtrackd — medtrack daemon
//!
//! Composition root that wires the embedded engine, the change channel, and
//! the SQL console together.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialize logging
//! - Construct the change notifier and attach this process's context
//! - Construct the `DataLayer` handle and start the embedded engine
//! - Log change notifications arriving from other contexts
//! - Serve the line-oriented SQL console on stdin/stdout
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod console;

use medtrack_adapter_storage_sqlite_sqlx::Config as EngineConfig;
use medtrack_app::change_notifier::ChangeNotifier;
use medtrack_app::data_layer::DataLayer;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::console::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Change channel
    let notifier = ChangeNotifier::new(config.channel.name.clone(), config.channel.backlog_warning);

    // Data layer
    let handle = notifier.attach();
    let store: Store = DataLayer::new(handle.clone(), config.query_timeout());
    let engine = EngineConfig {
        database_url: config.database_url().to_string(),
        max_connections: config.database.max_connections,
    };
    store.start(&engine).await?;
    tracing::info!(
        url = config.database_url(),
        channel = notifier.channel(),
        "medtrackd ready"
    );

    // Changes made by this store are not echoed back; only other contexts
    // attached to the notifier show up here.
    let watch_guard = handle.on_change(|event| {
        tracing::info!(kind = event.kind(), ?event, "change received");
    });

    // Console
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    console::run(&store, stdin, tokio::io::stdout()).await?;

    watch_guard.unsubscribe();
    notifier.close();
    Ok(())
}
