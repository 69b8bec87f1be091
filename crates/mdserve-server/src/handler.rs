//! Document request handling.
//!
//! [`DocumentHandler`] runs the per-request state machine: resolve the key,
//! consult the cache, and on a miss or stale entry fetch, render and store the
//! document.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderName;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use mdserve_cache::{CacheError, CachedDocument, DocumentCache, Transaction};
use mdserve_site::{PageTemplate, RenderPipeline};
use mdserve_storage::Storage;
use tracing::Dispatch;

use crate::error::ServerError;
use crate::key::{IndexConvention, KeyResolver};

/// Freshness window used when none is configured.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(60);

const SERVER_TIMING: &str = "server-timing";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Handler configuration.
#[derive(Clone)]
pub struct HandlerOptions {
    /// How long a rendered page may be served from the cache.
    pub cache_duration: Duration,
    /// Page template.
    pub template: Arc<dyn PageTemplate>,
    /// Diagnostic sink. The process-wide default subscriber is used when `None`.
    pub logger: Option<Dispatch>,
    /// URL prefix stripped before key derivation.
    pub base_path: String,
    /// Mapping for directory paths.
    pub index_convention: IndexConvention,
}

impl HandlerOptions {
    /// Create options with default settings for `template`.
    pub fn new(template: Arc<dyn PageTemplate>) -> Self {
        Self {
            cache_duration: DEFAULT_CACHE_DURATION,
            template,
            logger: None,
            base_path: String::new(),
            index_convention: IndexConvention::default(),
        }
    }

    #[must_use]
    pub fn with_cache_duration(mut self, cache_duration: Duration) -> Self {
        self.cache_duration = cache_duration;
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    #[must_use]
    pub fn with_index_convention(mut self, index_convention: IndexConvention) -> Self {
        self.index_convention = index_convention;
        self
    }
}

impl std::fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("cache_duration", &self.cache_duration)
            .field("logger", &self.logger.is_some())
            .field("base_path", &self.base_path)
            .field("index_convention", &self.index_convention)
            .finish_non_exhaustive()
    }
}

/// Whether a response came from the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Value of the `Server-Timing` header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cachehit",
            Self::Miss => "cachemiss",
        }
    }
}

/// Successful document response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServedDocument {
    pub body: Bytes,
    pub cache: CacheStatus,
}

impl IntoResponse for ServedDocument {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, HTML_CONTENT_TYPE),
                (HeaderName::from_static(SERVER_TIMING), self.cache.as_str()),
            ],
            self.body,
        )
            .into_response()
    }
}

/// Serves rendered markdown documents through a [`DocumentCache`].
///
/// Blocking: storage reads and rendering happen on the calling thread. The
/// router runs [`handle`](Self::handle) on tokio's blocking pool.
pub struct DocumentHandler {
    storage: Arc<dyn Storage>,
    cache: Arc<DocumentCache>,
    pipeline: RenderPipeline,
    resolver: KeyResolver,
    cache_duration: Duration,
    logger: Option<Dispatch>,
}

impl DocumentHandler {
    /// Create a handler.
    pub fn new(
        storage: Arc<dyn Storage>,
        cache: Arc<DocumentCache>,
        options: HandlerOptions,
    ) -> Self {
        Self {
            storage,
            cache,
            pipeline: RenderPipeline::new(options.template),
            resolver: KeyResolver::new(options.base_path, options.index_convention),
            cache_duration: options.cache_duration,
            logger: options.logger,
        }
    }

    /// Cache shared with this handler.
    #[must_use]
    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    /// Handle a request for `path`.
    ///
    /// Diagnostics go to the configured logger.
    pub fn handle(&self, path: &str) -> Result<ServedDocument, ServerError> {
        match &self.logger {
            Some(logger) => tracing::dispatcher::with_default(logger, || self.process(path)),
            None => self.process(path),
        }
    }

    fn process(&self, path: &str) -> Result<ServedDocument, ServerError> {
        let key = self.resolver.resolve(path);

        // Committed on every return path when dropped.
        let mut tx = self.cache.begin();
        let previous = tx.get(&key).inspect_err(|err| {
            tracing::error!(key = %key, error = %err, "Failed to read document cache");
        })?;

        if let Some(entry) = &previous
            && entry.is_fresh(Instant::now(), self.cache_duration)
        {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(ServedDocument {
                body: entry.body().clone(),
                cache: CacheStatus::Hit,
            });
        }
        tracing::debug!(key = %key, stale = previous.is_some(), "Cache miss");

        let source = self
            .storage
            .read(&key)
            .inspect_err(|err| {
                tracing::error!(key = %key, error = %err, "Failed to read document");
            })?
            .ok_or_else(|| {
                tracing::info!(key = %key, "Document not found");
                ServerError::NotFound(key.clone())
            })?;

        let page = self.pipeline.render(&source).inspect_err(|err| {
            tracing::error!(key = %key, error = %err, "Failed to render document");
        })?;

        let served = ServedDocument {
            body: Bytes::from(page.body),
            cache: CacheStatus::Miss,
        };

        let entry = CachedDocument::new(key.clone(), served.body.clone());
        if let Err(err) = store(tx, previous, entry) {
            tracing::error!(key = %key, error = %err, "Failed to update document cache");
        }

        Ok(served)
    }
}

fn store(
    mut tx: Transaction<'_>,
    previous: Option<Arc<CachedDocument>>,
    entry: CachedDocument,
) -> Result<(), CacheError> {
    tx.replace(previous, entry)?;
    tx.commit()
}

impl std::fmt::Debug for DocumentHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandler")
            .field("resolver", &self.resolver)
            .field("cache_duration", &self.cache_duration)
            .finish_non_exhaustive()
    }
}
