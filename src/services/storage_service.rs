//! src/services/storage_service.rs
//!
//! Read-only object storage. `ObjectStore` is what the router depends on;
//! `LocalObjectStore` implements it over a directory tree where every file is
//! an object and its path relative to the root is the key.

use crate::models::{
    listing::{DELIMITER, Listing, ListingRequest},
    object::{HttpMetadata, ObjectInfo, StoredObject},
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("delimiter `{0}` is not supported")]
    UnsupportedDelimiter(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Read capabilities the router needs from an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// List the direct children of `request.prefix`, grouping deeper keys
    /// into delimited prefixes.
    async fn list(&self, request: &ListingRequest) -> StorageResult<Listing>;

    /// Open an object for streaming. `Ok(None)` when no such object exists.
    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>>;
}

const MAX_OBJECT_KEY_LEN: usize = 1024;
const MAX_LIST_LIMIT: usize = 1000;

/// Object store backed by a local directory.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    /// Root directory; keys are paths relative to it.
    pub base_path: PathBuf,

    /// Maximum number of entries (objects plus prefixes) per listing page.
    pub list_limit: usize,
}

impl LocalObjectStore {
    pub fn new(base_path: impl Into<PathBuf>, list_limit: usize) -> Self {
        Self {
            base_path: base_path.into(),
            list_limit: list_limit.clamp(1, MAX_LIST_LIMIT),
        }
    }

    /// Resolve a key or prefix directory to a path under `base_path`.
    ///
    /// `None` for anything that could escape the root or that no stored key
    /// could ever have.
    fn resolve(&self, key: &str) -> Option<PathBuf> {
        if !is_key_safe(key) {
            return None;
        }
        let mut path = self.base_path.clone();
        path.extend(key.split('/').filter(|s| !s.is_empty()));
        Some(path)
    }

    async fn object_info(&self, key: String, path: &Path) -> io::Result<Option<ObjectInfo>> {
        let meta = fs::metadata(path).await?;
        if !meta.is_file() {
            return Ok(None);
        }
        let uploaded = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(UNIX_EPOCH));
        let etag = compute_etag(&key, meta.len(), &uploaded);
        let http_metadata = HttpMetadata {
            content_type: Some(content_type_for(&key).to_string()),
            ..Default::default()
        };

        Ok(Some(ObjectInfo {
            key,
            size: meta.len(),
            uploaded,
            etag,
            http_metadata,
        }))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self, request: &ListingRequest) -> StorageResult<Listing> {
        if request.delimiter != DELIMITER {
            return Err(StorageError::UnsupportedDelimiter(request.delimiter.clone()));
        }

        // "docs/rep" lists entries of `docs/` whose names start with `rep`.
        let (dir_prefix, name_prefix) = match request.prefix.rfind('/') {
            Some(pos) => request.prefix.split_at(pos + 1),
            None => ("", request.prefix.as_str()),
        };
        let Some(dir) = self.resolve(dir_prefix) else {
            debug!("refusing to list unsafe prefix {:?}", request.prefix);
            return Ok(Listing::default());
        };

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(Listing::default());
            }
            Err(err) => return Err(err.into()),
        };

        let mut found: Vec<Entry> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with(name_prefix) {
                continue;
            }
            let key = format!("{}{}", dir_prefix, name);
            if !is_key_safe(&key) {
                continue;
            }
            let path = entry.path();
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => found.push(Entry::Prefix(format!("{}/", key))),
                Ok(meta) if meta.is_file() => {
                    if let Some(info) = self.object_info(key, &path).await? {
                        found.push(Entry::Object(info));
                    }
                }
                Ok(_) => {}
                // dangling symlink or raced removal
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        found.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));

        let truncated = found.len() > self.list_limit;
        found.truncate(self.list_limit);
        let cursor = if truncated {
            found
                .last()
                .map(|entry| encode_cursor(entry.sort_key()))
        } else {
            None
        };

        let mut listing = Listing {
            truncated,
            cursor,
            ..Default::default()
        };
        for entry in found {
            match entry {
                Entry::Object(info) => listing.objects.push(info),
                Entry::Prefix(prefix) => listing.delimited_prefixes.push(prefix),
            }
        }

        Ok(listing)
    }

    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        if key.ends_with('/') {
            return Ok(None);
        }
        let Some(path) = self.resolve(key) else {
            debug!("refusing unsafe key {:?}", key);
            return Ok(None);
        };

        let info = match self.object_info(key.to_string(), &path).await {
            Ok(Some(info)) => info,
            Ok(None) => return Ok(None),
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(StoredObject {
            key: info.key,
            size: info.size,
            uploaded: info.uploaded,
            etag: info.etag,
            http_metadata: info.http_metadata,
            body: ReaderStream::new(file).boxed(),
        }))
    }
}

enum Entry {
    Object(ObjectInfo),
    Prefix(String),
}

impl Entry {
    fn sort_key(&self) -> &str {
        match self {
            Entry::Object(info) => &info.key,
            Entry::Prefix(prefix) => prefix,
        }
    }
}

/// Basic key validation to avoid path traversal.
///
/// Rejects absolute keys, `.`/`..` segments, empty interior segments,
/// backslashes and control characters. A single trailing `/` is allowed so
/// prefixes pass through the same check.
fn is_key_safe(key: &str) -> bool {
    if key.len() > MAX_OBJECT_KEY_LEN || key.starts_with('/') {
        return false;
    }
    if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
        return false;
    }
    let trimmed = key.strip_suffix('/').unwrap_or(key);
    if trimmed.is_empty() {
        return key.is_empty();
    }
    trimmed
        .split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Entity tag derived from what identifies one version of a file.
fn compute_etag(key: &str, size: u64, modified: &DateTime<Utc>) -> String {
    let digest = md5::compute(format!(
        "{}:{}:{}",
        key,
        size,
        modified.timestamp_nanos_opt().unwrap_or_default()
    ));
    format!("{:x}", digest)
}

fn encode_cursor(last_key: &str) -> String {
    general_purpose::STANDARD.encode(last_key)
}

/// Guess a MIME type from the key's extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = key
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("txt") | Some("log") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("csv") => "text/csv; charset=utf-8",
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("tar") => "application/x-tar",
        Some("wasm") => "application/wasm",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
