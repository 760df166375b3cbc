//! Defines the HTTP surface of the browser.
//!
//! ## Structure
//! - `ANY /api/list?prefix=`   — list one level of the namespace (JSON)
//! - `ANY /api/file/{*key}`    — download one object, token required
//! - `ANY /api/...` otherwise  — 404 with an empty body
//! - anything else             — static asset or the UI's `index.html`
//!
//! The wildcard `*key` allows nested keys like `photos/2025/img.jpg`; it does
//! not match an empty key, so `/api/file/` gets its own route.

use crate::{
    handlers::{
        object_handlers::{get_file, list_objects, missing_key},
        shell_handlers::fallback,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::any,
};
use tracing::Instrument;
use uuid::Uuid;

/// Build the router. Every route accepts any method.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/list", any(list_objects))
        .route("/api/file/", any(missing_key))
        .route("/api/file/{*key}", any(get_file))
        .fallback(fallback)
        .layer(middleware::from_fn(trace_request))
}

/// Run each request inside a span tagged with a fresh request id.
async fn trace_request(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let response = next.run(request).await;
        tracing::debug!(status = response.status().as_u16(), "request complete");
        response
    }
    .instrument(span)
    .await
}
