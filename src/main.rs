// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use larder::recipe::Lifecycle;
use larder::server::{self, LarderConfig, ServerConfig};
use larder::{Registry, RecipeStore};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "larder")]
#[command(author, version, about = "Recipe distribution server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Path to a TOML config file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Create the storage directories and migrate the database
    Init {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Report records and archives that disagree
    Audit {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_server_config(path: Option<&PathBuf>) -> Result<ServerConfig> {
    let config = LarderConfig::resolve(path.map(PathBuf::as_path))?;
    config.to_server_config()
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            let mut server_config = load_server_config(config.as_ref())?;
            if let Some(bind) = bind {
                server_config.bind_addr = bind
                    .parse()
                    .with_context(|| format!("Invalid bind address: {}", bind))?;
            }

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(server::run_server(server_config))
        }
        Commands::Init { config } => {
            let server_config = load_server_config(config.as_ref())?;
            server::prepare_storage(&server_config)?;
            info!(
                "Initialized {} and {}",
                server_config.db_path.display(),
                server_config.recipe_dir.display()
            );
            println!("Storage initialized at: {}", server_config.recipe_dir.display());
            Ok(())
        }
        Commands::Audit { config } => {
            let server_config = load_server_config(config.as_ref())?;
            let lifecycle = Lifecycle::new(
                Registry::new(&server_config.db_path),
                RecipeStore::new(&server_config.recipe_dir),
            );

            let findings = lifecycle.audit()?;
            if findings.is_empty() {
                println!("Registry and archive store agree");
                return Ok(());
            }
            for finding in &findings {
                println!("{}", finding);
            }
            anyhow::bail!("{} inconsistencies found", findings.len())
        }
    }
}
