//! HTTP handlers for the listing and download endpoints.
//! Streams object bodies to avoid buffering in memory and delegates storage
//! concerns to the `ObjectStore` in `AppState`.

use crate::{
    errors::AppError,
    handlers::{auth::provided_token, query_param},
    models::listing::{ListingRequest, ListingResult},
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State, rejection::PathRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info, warn};

/// `/api/list?prefix=` — one level of the namespace as JSON. Not protected.
pub async fn list_objects(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let prefix = query_param(&query, "prefix").unwrap_or_default();
    info!(prefix = %prefix, "listing objects");

    let listing = state.objects.list(&ListingRequest::new(prefix)).await?;
    debug!(
        objects = listing.objects.len(),
        prefixes = listing.delimited_prefixes.len(),
        truncated = listing.truncated,
        "listing complete"
    );

    Ok(Json(ListingResult::from(listing)).into_response())
}

/// `/api/file/` with nothing after it.
pub async fn missing_key() -> AppError {
    AppError::not_found("Missing key")
}

/// `/api/file/{*key}` — stream one object as a download, token required.
pub async fn get_file(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    // Undecodable keys (e.g. `%FF`) name nothing that could be stored.
    let key = match key {
        Ok(Path(key)) if !key.is_empty() => key,
        Ok(_) => return Err(AppError::not_found("Missing key")),
        Err(rejection) => {
            debug!("undecodable object key: {}", rejection);
            return Err(AppError::not_found("Missing key"));
        }
    };

    let provided = provided_token(&headers, &query);
    let Some(expected) = state.tokens.resolve_expected_token().await? else {
        error!("download token is not configured; refusing all downloads");
        return Err(AppError::internal("Token not configured"));
    };
    if provided.as_deref() != Some(expected.as_str()) {
        warn!(key = %key, supplied = provided.is_some(), "rejected download credential");
        return Err(AppError::unauthorized());
    }

    let Some(object) = state.objects.get(&key).await? else {
        debug!(key = %key, "object not found");
        return Err(AppError::not_found("Object Not Found"));
    };
    info!(key = %key, size = object.size, "serving object");

    let mut resp_headers = HeaderMap::new();
    object.write_http_metadata(&mut resp_headers);
    if let Ok(etag) = HeaderValue::from_str(&object.http_etag()) {
        resp_headers.insert(header::ETAG, etag);
    }
    resp_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(object.size));
    if let Ok(modified) = HeaderValue::from_str(
        &object
            .uploaded
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string(),
    ) {
        resp_headers.insert(header::LAST_MODIFIED, modified);
    }
    resp_headers.insert(
        header::CONTENT_DISPOSITION,
        attachment_disposition(download_filename(&object.key)),
    );

    let mut response = Response::new(Body::from_stream(object.body));
    *response.status_mut() = StatusCode::OK;
    *response.headers_mut() = resp_headers;
    Ok(response)
}

/// Last path segment of `key`, or `download` when it has none.
fn download_filename(key: &str) -> &str {
    key.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("download")
}

fn attachment_disposition(filename: &str) -> HeaderValue {
    let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_bytes(format!("attachment; filename=\"{}\"", escaped).as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"download\""))
}
