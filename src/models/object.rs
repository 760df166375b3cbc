//! Represents objects as the storage backend describes them.

use axum::http::{HeaderMap, HeaderValue, header};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::{fmt, io};

/// Byte stream of an object's payload, forwarded to the client as it is read.
pub type ObjectBody = BoxStream<'static, io::Result<Bytes>>;

/// Standard HTTP metadata stored alongside an object.
///
/// Each field maps to one response header; unset fields write nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpMetadata {
    pub content_type: Option<String>,
    pub content_language: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub cache_control: Option<String>,
}

impl HttpMetadata {
    /// Populate `headers` from this metadata.
    ///
    /// Values that are not valid header values are skipped.
    pub fn write_http_metadata(&self, headers: &mut HeaderMap) {
        let fields = [
            (header::CONTENT_TYPE, &self.content_type),
            (header::CONTENT_LANGUAGE, &self.content_language),
            (header::CONTENT_DISPOSITION, &self.content_disposition),
            (header::CONTENT_ENCODING, &self.content_encoding),
            (header::CACHE_CONTROL, &self.cache_control),
        ];

        for (name, value) in fields {
            if let Some(value) = value.as_deref() {
                if let Ok(value) = HeaderValue::from_str(value) {
                    headers.insert(name, value);
                }
            }
        }
    }
}

/// One entry of a backend listing.
///
/// Carries everything the backend knows about the object; only part of it is
/// exposed to clients (see `models::listing::ObjectSummary`).
#[derive(Clone, Debug)]
pub struct ObjectInfo {
    /// Object key (path-like identifier).
    pub key: String,

    /// Size in bytes.
    pub size: u64,

    /// When the object was written.
    pub uploaded: DateTime<Utc>,

    /// Entity tag without surrounding quotes.
    pub etag: String,

    /// Metadata the object would be served with.
    pub http_metadata: HttpMetadata,
}

impl ObjectInfo {
    /// Entity tag in the quoted form used by the `ETag` header.
    pub fn http_etag(&self) -> String {
        quote_etag(&self.etag)
    }
}

/// An object opened for reading.
///
/// The body has not been read yet; handing it to the response streams it.
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    pub uploaded: DateTime<Utc>,
    pub etag: String,
    pub http_metadata: HttpMetadata,
    pub body: ObjectBody,
}

impl StoredObject {
    pub fn http_etag(&self) -> String {
        quote_etag(&self.etag)
    }

    /// Populate `headers` from the stored HTTP metadata.
    pub fn write_http_metadata(&self, headers: &mut HeaderMap) {
        self.http_metadata.write_http_metadata(headers);
    }
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("key", &self.key)
            .field("size", &self.size)
            .field("uploaded", &self.uploaded)
            .field("etag", &self.etag)
            .field("http_metadata", &self.http_metadata)
            .finish_non_exhaustive()
    }
}

fn quote_etag(etag: &str) -> String {
    format!("\"{}\"", etag)
}
