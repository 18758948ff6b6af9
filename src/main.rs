/*!
 * Pulsar CLI - run one collection command against a Star
 *
 *   pulsar [--host H] [--port P] <command> [args...]
 *   pulsar set-host <host>
 *   pulsar set-port <port>
 */

use clap::{Parser, Subcommand};
use pulsar::{
    build_registry,
    error::{exit_code_for, PulsarError, Result, EXIT_SUCCESS},
    logging, render, PulsarConfig, Session,
};
use pulsar_core_people::JsonFileStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pulsar")]
#[command(version, about = "Send collection commands to a Pulsar Star over UDP", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Star host (overrides the config file)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Star port (overrides the config file)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Configuration file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Run against the local store file instead of the Star; only `save` writes it
    #[arg(long, global = true)]
    offline: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a new Star host in the config file
    SetHost { host: String },

    /// Store a new Star port in the config file
    SetPort { port: u16 },

    /// Any collection command, e.g. `show` or `remove_by_id 3`
    #[command(external_subcommand)]
    Exec(Vec<String>),
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = PulsarConfig::load(cli.config.as_deref())?;
    if let Some(ref host) = cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.verbose |= cli.verbose;

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::SetHost { host } => {
            persist(cli.config, |c| c.host = host)?;
            Ok(EXIT_SUCCESS)
        }
        Commands::SetPort { port } => {
            persist(cli.config, |c| c.port = port)?;
            Ok(EXIT_SUCCESS)
        }
        Commands::Exec(line) => execute_line(&config, cli.offline, line),
    }
}

/// Rewrite one field of the config file, leaving CLI overrides out of it
fn persist(path: Option<PathBuf>, update: impl FnOnce(&mut PulsarConfig)) -> Result<()> {
    let path = path
        .or_else(PulsarConfig::default_path)
        .ok_or_else(|| PulsarError::Usage("No config directory; pass --config".to_string()))?;

    let mut stored = if path.exists() {
        PulsarConfig::from_file(&path)?
    } else {
        PulsarConfig::default()
    };
    update(&mut stored);
    stored.to_file(&path)?;

    tracing::info!("Connection settings saved to {}", path.display());
    println!("Now using {}:{}", stored.host, stored.port);
    Ok(())
}

fn execute_line(config: &PulsarConfig, offline: bool, line: Vec<String>) -> Result<i32> {
    let (alias, tokens) = line
        .split_first()
        .ok_or_else(|| PulsarError::Usage("No command given".to_string()))?;

    let registry = build_registry()?;
    let runtime = tokio::runtime::Runtime::new()?;

    let envelope = runtime.block_on(async {
        let mut session = if offline {
            let store = Arc::new(JsonFileStore::new(config.store_path.clone()));
            Session::offline(registry, store)?
        } else {
            Session::remote(registry, config.client_config()).await
        };
        let envelope = session.run(alias, tokens).await;
        session.close();
        Ok::<_, PulsarError>(envelope)
    })?;

    render(&envelope)?;
    Ok(exit_code_for(envelope.status))
}
