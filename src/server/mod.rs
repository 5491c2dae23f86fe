// src/server/mod.rs
//! Larder HTTP server
//!
//! Serves the public recipe API (search, download, upstream passthrough),
//! the submission endpoints and the admin review endpoints. All state lives
//! in the registry database and the archive store; the server keeps nothing
//! in memory beyond login throttling.

mod auth;
pub mod config;
mod handlers;
mod response;
mod routes;
pub mod security;

pub use auth::AdminSession;
pub use config::LarderConfig;
pub use response::{ApiError, Notice};
pub use routes::create_router;
pub use security::LoginThrottle;

use crate::accounts::Accounts;
use crate::db::{self, Registry};
use crate::recipe::{Creation, ImportConfig, Importer, Lifecycle, SearchService};
use crate::store::RecipeStore;
use crate::upstream::UpstreamClient;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Path to the registry database
    pub db_path: PathBuf,
    /// Archive store root (`private/` lives beneath it)
    pub recipe_dir: PathBuf,
    /// Largest accepted multipart body
    pub max_upload_bytes: usize,
    /// Upstream recipe service base URL
    pub upstream_url: String,
    /// Request timeout for upstream and GitHub fetches
    pub upstream_timeout: Duration,
    pub import: ImportConfig,
    /// Needle that lists all published local recipes
    pub sentinel: String,
    /// Admin registration key (None = registration closed)
    pub registration_key: Option<String>,
    pub login_failure_threshold: u32,
    pub login_lockout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3333)),
            db_path: PathBuf::from("/var/lib/larder/larder.db"),
            recipe_dir: PathBuf::from("/var/lib/larder/recipes"),
            max_upload_bytes: 50 * 1024 * 1024,
            upstream_url: "https://api.franzinfra.com".to_string(),
            upstream_timeout: Duration::from_secs(30),
            import: ImportConfig::default(),
            sentinel: crate::recipe::search::DEFAULT_SENTINEL.to_string(),
            registration_key: None,
            login_failure_threshold: 5,
            login_lockout: Duration::from_secs(300),
        }
    }
}

/// Shared server state
pub struct ServerState {
    pub config: ServerConfig,
    pub registry: Registry,
    pub store: RecipeStore,
    pub upstream: UpstreamClient,
    pub importer: Importer,
    pub creation: Creation,
    pub lifecycle: Lifecycle,
    pub search: SearchService,
    pub accounts: Accounts,
    /// Failed-login tracking for `/admin/login`
    pub login_throttle: LoginThrottle,
}

impl ServerState {
    /// Wire collaborators from `config`; does not touch the filesystem
    pub fn new(config: ServerConfig) -> crate::Result<Self> {
        let registry = Registry::new(&config.db_path);
        let store = RecipeStore::new(&config.recipe_dir);
        let upstream = UpstreamClient::new(&config.upstream_url, config.upstream_timeout)?;
        let importer = Importer::new(upstream.http().clone(), config.import.clone());
        let creation = Creation::new(registry.clone(), store.clone());
        let lifecycle = Lifecycle::new(registry.clone(), store.clone());
        let search = SearchService::new(registry.clone(), upstream.clone(), &config.sentinel);
        let accounts = Accounts::new(registry.clone(), config.registration_key.clone());
        let login_throttle =
            LoginThrottle::new(config.login_failure_threshold, config.login_lockout);

        Ok(Self {
            config,
            registry,
            store,
            upstream,
            importer,
            creation,
            lifecycle,
            search,
            accounts,
            login_throttle,
        })
    }
}

/// Create the database and archive directories
pub fn prepare_storage(config: &ServerConfig) -> Result<()> {
    db::init(&config.db_path)
        .with_context(|| format!("Failed to initialize {}", config.db_path.display()))?;
    RecipeStore::new(&config.recipe_dir)
        .ensure_dirs()
        .with_context(|| format!("Failed to create {}", config.recipe_dir.display()))?;
    Ok(())
}

/// Start the Larder server
pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting Larder server on {}", config.bind_addr);
    tracing::info!("Database: {:?}", config.db_path);
    tracing::info!("Recipe store: {:?}", config.recipe_dir);
    tracing::info!("Upstream: {}", config.upstream_url);
    if config.registration_key.is_none() {
        tracing::info!("Admin registration: closed (no registration key set)");
    }

    prepare_storage(&config)?;

    let state = Arc::new(ServerState::new(config.clone())?);
    let app = create_router(state.clone());

    // Expired lockouts are only dropped here
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_state.login_throttle.cleanup().await;
        }
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Larder is ready to serve");

    axum::serve(listener, app).await?;
    Ok(())
}
