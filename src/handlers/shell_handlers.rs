//! Everything the API routes do not claim.
//!
//! Unknown `/api/*` paths get a bare 404. Any other path is treated as a
//! client-side route of the UI: a file that exists in the asset bundle is
//! served as is, otherwise the request is rewritten to `/index.html`.

use crate::{
    errors::AppError,
    services::asset_service::{AssetError, AssetFetcher},
    state::AppState,
};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

const API_PREFIX: &str = "/api/";
const APP_SHELL: &str = "/index.html";

/// Router fallback.
pub async fn fallback(State(state): State<AppState>, request: Request) -> Response {
    if request.uri().path().starts_with(API_PREFIX) {
        debug!("no API route for {}", request.uri().path());
        return AppError::empty(StatusCode::NOT_FOUND).into_response();
    }

    match state.assets.as_deref() {
        Some(assets) => app_shell(assets, request).await,
        None => {
            debug!("no asset directory configured; cannot serve the app shell");
            AppError::not_found("Not Found").into_response()
        }
    }
}

async fn app_shell(assets: &dyn AssetFetcher, request: Request) -> Response {
    let (mut parts, body) = request.into_parts();

    if parts.uri.path() != "/" {
        let direct = Request::from_parts(parts.clone(), Body::empty());
        match assets.fetch(direct).await {
            Ok(response) => return response,
            Err(AssetError::NotFound(_)) => {}
            Err(err) => return AppError::from(err).into_response(),
        }
    }

    parts.uri = Uri::from_static(APP_SHELL);
    match assets.fetch(Request::from_parts(parts, body)).await {
        Ok(response) => response,
        Err(err) => {
            error!("Error fetching {}: {}", APP_SHELL, err);
            AppError::not_found("Not Found").into_response()
        }
    }
}
