//! Static assets for the browser UI.

use crate::services::storage_service::content_type_for;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Serves requests for static files.
#[async_trait]
pub trait AssetFetcher: Send + Sync + 'static {
    async fn fetch(&self, request: Request) -> Result<Response, AssetError>;
}

/// Files under a local directory, typically the built UI.
#[derive(Clone, Debug)]
pub struct StaticAssets {
    pub root: PathBuf,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, uri_path: &str) -> Option<PathBuf> {
        let relative = uri_path.strip_prefix('/')?;
        if relative.is_empty() || relative.contains('\\') {
            return None;
        }
        let mut path = self.root.clone();
        for segment in relative.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}

#[async_trait]
impl AssetFetcher for StaticAssets {
    async fn fetch(&self, request: Request) -> Result<Response, AssetError> {
        let uri_path = request.uri().path();
        let not_found = || AssetError::NotFound(uri_path.to_string());
        let path = self.resolve(uri_path).ok_or_else(not_found)?;

        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(not_found()),
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Err(not_found());
            }
            Err(err) => return Err(err.into()),
        };
        let file = File::open(&path).await?;

        let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
        *response.status_mut() = StatusCode::OK;
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type_for(uri_path)),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.len()));
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn serves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>")
            .await
            .unwrap();
        let assets = StaticAssets::new(dir.path());

        let response = assets.fetch(get("/index.html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<html></html>");
    }

    #[tokio::test]
    async fn missing_and_traversing_paths_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("assets")).await.unwrap();
        let assets = StaticAssets::new(dir.path().join("assets"));

        for uri in ["/", "/assets", "/missing.js", "/../secret", "/a//b.js"] {
            assert!(
                matches!(assets.fetch(get(uri)).await, Err(AssetError::NotFound(_))),
                "uri {uri}"
            );
        }
    }
}
