//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::Uri;
use axum::routing::get;
use mdserve_cache::DocumentCache;
use mdserve_storage::Storage;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::handler::{DocumentHandler, HandlerOptions, ServedDocument};

/// Create a router serving every GET path as a markdown document.
///
/// The cache is owned by the caller, so several routers can share one cache
/// or use independent ones.
pub fn router(
    storage: Arc<dyn Storage>,
    cache: Arc<DocumentCache>,
    options: HandlerOptions,
) -> Router {
    let handler = Arc::new(DocumentHandler::new(storage, cache, options));

    Router::new()
        .route("/", get(serve_document))
        .route("/{*path}", get(serve_document))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

/// Handle GET for any path.
async fn serve_document(
    State(handler): State<Arc<DocumentHandler>>,
    uri: Uri,
) -> Result<ServedDocument, ServerError> {
    let path = uri.path().to_owned();
    tokio::task::spawn_blocking(move || handler.handle(&path))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "Request task failed");
            ServerError::Task(err.to_string())
        })?
}
