//! wardend: the Warden daemon.
//!
//! Serves the validating environment API over a redb state store, and
//! offers offline tools around the same validators:
//! - `serve` runs the REST API
//! - `check` validates one request body against the store without applying it
//! - `import` loads releases, plugins and nodes from a JSON file
//!
//! # Usage
//!
//! ```text
//! wardend serve --port 8000 --data-dir /var/lib/warden --config warden.toml
//! wardend check cluster-update --cluster 1 --file body.json
//! wardend import --file catalog.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use warden_core::ValidatorConfig;

mod commands;

use commands::check::CheckArgs;

const DEFAULT_FILTER: &str = "info,wardend=debug,warden=debug";

#[derive(Parser)]
#[command(name = "wardend", about = "Warden environment API daemon", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the REST API.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/warden")]
        data_dir: PathBuf,

        /// Validator configuration (warden.toml). Built-in defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate a request against the stored state without applying it.
    Check {
        #[command(flatten)]
        args: CheckArgs,

        #[arg(long, default_value = "/var/lib/warden")]
        data_dir: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Load releases, plugins and nodes into the state store.
    Import {
        /// JSON file with `releases`, `plugins` and `nodes` lists.
        #[arg(long)]
        file: PathBuf,

        #[arg(long, default_value = "/var/lib/warden")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            data_dir,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            commands::serve::run(port, &data_dir, config).await
        }
        Command::Check {
            args,
            data_dir,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let store = open_store(&data_dir)?;
            commands::check::run(&store, &config, &args)
        }
        Command::Import { file, data_dir } => {
            let store = open_store(&data_dir)?;
            commands::import::run(&store, &file)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ValidatorConfig> {
    match path {
        Some(path) => {
            let config = ValidatorConfig::from_file(path)
                .with_context(|| format!("loading validator config {}", path.display()))?;
            info!(path = %path.display(), "validator config loaded");
            Ok(config)
        }
        None => {
            info!("using built-in validator defaults");
            Ok(ValidatorConfig::default())
        }
    }
}

fn open_store(data_dir: &Path) -> anyhow::Result<warden_state::StateStore> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let db_path = data_dir.join("warden.redb");
    let store = warden_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");
    Ok(store)
}
