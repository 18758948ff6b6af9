//! Pulsar Star - serves the people collection over UDP.
//!
//! Loads the collection from its store, binds the configured address and
//! answers requests until interrupted. The collection is only written back
//! when a client issues `save`.

use anyhow::{Context, Result};
use clap::Parser;
use pulsar::config::PulsarConfig;
use pulsar::logging::init_logging;
use pulsar_core_dispatch::{CommandRegistry, ResourceSet};
use pulsar_core_people::{
    register_people_commands, Database, JsonFileStore, PeopleCollection, PeopleStore,
};
use pulsar_star::UdpServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Pulsar Star - UDP command server for the people collection.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "PULSAR_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// People file to load and save
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut config =
        PulsarConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(store) = args.store {
        config.store_path = store;
    }
    config.verbose |= args.debug;

    init_logging(&config).context("Failed to initialize logging")?;

    info!("Pulsar Star v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(JsonFileStore::new(&config.store_path));
    let people = store
        .load()
        .with_context(|| format!("Failed to load people from {}", store.describe()))?;
    let collection = Arc::new(
        PeopleCollection::from_people(people)
            .with_context(|| format!("Failed to load people from {}", store.describe()))?,
    );
    info!("Collection ready with {} people", collection.len());

    let registry = Arc::new(CommandRegistry::new());
    register_people_commands(&registry).context("Failed to register commands")?;

    let resources = ResourceSet::new()
        .with(collection)
        .with(Arc::new(Database::new(store)));

    let addr = config.bind_addr().context("Invalid bind address")?;
    let mut server = UdpServer::bind(addr, registry, resources)
        .await
        .context("Failed to start Star")?;

    server
        .serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
