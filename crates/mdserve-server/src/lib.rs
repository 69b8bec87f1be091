//! HTTP serving of markdown documents for mdserve.
//!
//! Every GET path below the configured base path maps to a markdown document.
//! Rendered pages are kept in a [`DocumentCache`] and reused for the configured
//! freshness window.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use mdserve_cache::DocumentCache;
//! use mdserve_server::{HandlerOptions, router};
//! use mdserve_site::MinijinjaTemplate;
//! use mdserve_storage::FsStorage;
//!
//! let storage = Arc::new(FsStorage::new("docs".into()));
//! let template = Arc::new(MinijinjaTemplate::builtin()?);
//! let app = router(storage, Arc::new(DocumentCache::new()), HandlerOptions::new(template));
//! ```
//!
//! # Request Flow
//!
//! ```text
//! GET /docs/guide
//!   │
//!   ├─► KeyResolver ──► "guide.md"
//!   │
//!   ├─► DocumentCache (fresh?) ──► 200 cachehit
//!   │
//!   └─► Storage ──► RenderPipeline ──► 200 cachemiss ──► DocumentCache.replace
//! ```

mod app;
mod error;
mod handler;
mod key;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use mdserve_cache::DocumentCache;
use mdserve_config::IndexMode;
use mdserve_site::{MinijinjaTemplate, PageTemplate};
use mdserve_storage::{FsStorage, Storage};

pub use app::router;
pub use error::ServerError;
pub use handler::{
    CacheStatus, DEFAULT_CACHE_DURATION, DocumentHandler, HandlerOptions, ServedDocument,
};
pub use key::{IndexConvention, KeyResolver};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Markdown source directory.
    pub source_dir: PathBuf,
    /// URL prefix stripped before key derivation.
    pub base_path: String,
    /// Mapping for directory paths.
    pub index_convention: IndexConvention,
    /// Freshness window for rendered pages.
    pub cache_duration: Duration,
    /// Page template file (`None` uses the built-in template).
    pub template: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            source_dir: PathBuf::from("docs"),
            base_path: String::new(),
            index_convention: IndexConvention::default(),
            cache_duration: DEFAULT_CACHE_DURATION,
            template: None,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the template cannot be loaded or the server fails to
/// start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(config.source_dir.clone()));

    let template: Arc<dyn PageTemplate> = match &config.template {
        Some(path) => Arc::new(MinijinjaTemplate::from_file(path)?),
        None => Arc::new(MinijinjaTemplate::builtin()?),
    };

    let options = HandlerOptions::new(template)
        .with_cache_duration(config.cache_duration)
        .with_base_path(config.base_path.clone())
        .with_index_convention(config.index_convention);

    let app = router(storage, Arc::new(DocumentCache::new()), options);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, source_dir = %config.source_dir.display(), "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Create server configuration from mdserve config.
#[must_use]
pub fn server_config_from_config(config: &mdserve_config::Config) -> ServerConfig {
    let index_convention = match config.docs_resolved.index {
        IndexMode::Index => IndexConvention::IndexFile,
        IndexMode::Literal => IndexConvention::Literal,
    };

    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        source_dir: config.docs_resolved.source_dir.clone(),
        base_path: config.docs_resolved.base_path.clone(),
        index_convention,
        cache_duration: config.cache.duration(),
        template: config.template_path.clone(),
    }
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
