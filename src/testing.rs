//! In-memory stand-ins for the object store, secret store and asset server.

use crate::{
    models::{
        listing::{Listing, ListingRequest},
        object::{HttpMetadata, ObjectInfo, StoredObject},
    },
    services::{
        asset_service::{AssetError, AssetFetcher},
        storage_service::{ObjectStore, StorageError, StorageResult},
        token_service::{SecretError, SecretResult, SecretStore},
    },
};
use async_trait::async_trait;
use axum::{body::Body, extract::Request, response::Response};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    io,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

struct MemoryObject {
    body: Bytes,
    content_type: String,
    uploaded: DateTime<Utc>,
}

impl MemoryObject {
    fn info(&self, key: &str) -> ObjectInfo {
        ObjectInfo {
            key: key.to_string(),
            size: self.body.len() as u64,
            uploaded: self.uploaded,
            etag: format!("{:x}", md5::compute(&self.body)),
            http_metadata: HttpMetadata {
                content_type: Some(self.content_type.clone()),
                ..Default::default()
            },
        }
    }
}

#[derive(Default)]
struct ObjectsInner {
    objects: BTreeMap<String, MemoryObject>,
    page_size: Option<usize>,
    failure: Option<String>,
    list_requests: Vec<ListingRequest>,
    get_requests: Vec<String>,
}

/// Object store over a sorted map that records every call.
#[derive(Default)]
pub struct MemoryObjectStore {
    inner: Mutex<ObjectsInner>,
}

impl MemoryObjectStore {
    pub fn put(&self, key: &str, body: Vec<u8>, content_type: &str) {
        self.inner.lock().unwrap().objects.insert(
            key.to_string(),
            MemoryObject {
                body: Bytes::from(body),
                content_type: content_type.to_string(),
                uploaded: Utc::now(),
            },
        );
    }

    pub fn set_page_size(&self, size: usize) {
        self.inner.lock().unwrap().page_size = Some(size);
    }

    /// Make every subsequent call fail with an I/O error carrying `msg`.
    pub fn fail_with(&self, msg: &str) {
        self.inner.lock().unwrap().failure = Some(msg.to_string());
    }

    pub fn list_requests(&self) -> Vec<ListingRequest> {
        self.inner.lock().unwrap().list_requests.clone()
    }

    pub fn get_requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().get_requests.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, request: &ListingRequest) -> StorageResult<Listing> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_requests.push(request.clone());
        if let Some(msg) = &inner.failure {
            return Err(StorageError::Io(io::Error::other(msg.clone())));
        }

        let mut prefixes = BTreeSet::new();
        let mut objects = Vec::new();
        for (key, object) in inner.objects.range(request.prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&request.prefix) else {
                break;
            };
            match rest.find(&request.delimiter) {
                Some(pos) => {
                    prefixes.insert(format!(
                        "{}{}",
                        request.prefix,
                        &rest[..pos + request.delimiter.len()]
                    ));
                }
                None => objects.push(object.info(key)),
            }
        }

        let mut entries: Vec<(String, Option<ObjectInfo>)> = prefixes
            .into_iter()
            .map(|p| (p, None))
            .chain(objects.into_iter().map(|o| (o.key.clone(), Some(o))))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let page_size = inner.page_size.unwrap_or(1000);
        let truncated = entries.len() > page_size;
        entries.truncate(page_size);

        let mut listing = Listing {
            truncated,
            cursor: truncated.then(|| entries.last().map(|e| e.0.clone())).flatten(),
            ..Default::default()
        };
        for (key, info) in entries {
            match info {
                Some(info) => listing.objects.push(info),
                None => listing.delimited_prefixes.push(key),
            }
        }
        Ok(listing)
    }

    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        let mut inner = self.inner.lock().unwrap();
        inner.get_requests.push(key.to_string());
        if let Some(msg) = &inner.failure {
            return Err(StorageError::Io(io::Error::other(msg.clone())));
        }

        Ok(inner.objects.get(key).map(|object| {
            let info = object.info(key);
            StoredObject {
                key: info.key,
                size: info.size,
                uploaded: info.uploaded,
                etag: info.etag,
                http_metadata: info.http_metadata,
                body: stream::once(futures::future::ready(Ok(object.body.clone()))).boxed(),
            }
        }))
    }
}

/// Secret store over a map; records the names it was asked for.
#[derive(Default)]
pub struct MemorySecretStore {
    values: Mutex<HashMap<String, String>>,
    lookups: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemorySecretStore {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (name, value) in pairs {
            store.set(name, value);
        }
        store
    }

    pub fn set(&self, name: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    pub fn clear(&self) {
        self.values.lock().unwrap().clear();
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, name: &str) -> SecretResult<Option<String>> {
        self.lookups.lock().unwrap().push(name.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(SecretError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(self.values.lock().unwrap().get(name).cloned())
    }
}

/// Asset server over a path -> body map, or one that always errors.
#[derive(Default)]
pub struct MemoryAssets {
    files: HashMap<String, String>,
    failing: bool,
    requests: Mutex<Vec<String>>,
}

impl MemoryAssets {
    pub fn with(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, body)| (path.to_string(), body.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    /// URIs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetFetcher for MemoryAssets {
    async fn fetch(&self, request: Request) -> Result<Response, AssetError> {
        self.requests
            .lock()
            .unwrap()
            .push(request.uri().to_string());
        if self.failing {
            return Err(AssetError::Io(io::Error::other("asset server unavailable")));
        }
        let path = request.uri().path();
        match self.files.get(path) {
            Some(body) => Ok(Response::new(Body::from(body.clone()))),
            None => Err(AssetError::NotFound(path.to_string())),
        }
    }
}
