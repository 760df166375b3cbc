//! Listing request sent to the backend and the JSON shape returned to clients.

use crate::models::object::ObjectInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Only delimiter the browser ever asks for.
pub const DELIMITER: &str = "/";

/// A one-level query over the key namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingRequest {
    pub prefix: String,
    pub delimiter: String,
}

impl ListingRequest {
    /// List the direct children of `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: DELIMITER.to_string(),
        }
    }
}

/// What the backend returns for a [`ListingRequest`].
#[derive(Clone, Debug, Default)]
pub struct Listing {
    pub objects: Vec<ObjectInfo>,
    pub delimited_prefixes: Vec<String>,
    pub truncated: bool,
    pub cursor: Option<String>,
}

/// Wire shape of `GET /api/list`.
///
/// Clients depend on these field names; backend fields are never copied
/// through wholesale.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListingResult {
    pub objects: Vec<ObjectSummary>,
    pub delimited_prefixes: Vec<String>,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub etag: String,
}

impl From<&ObjectInfo> for ObjectSummary {
    fn from(info: &ObjectInfo) -> Self {
        Self {
            key: info.key.clone(),
            size: info.size,
            uploaded_at: info.uploaded,
            etag: info.http_etag(),
        }
    }
}

impl From<Listing> for ListingResult {
    fn from(listing: Listing) -> Self {
        Self {
            objects: listing.objects.iter().map(ObjectSummary::from).collect(),
            delimited_prefixes: listing.delimited_prefixes,
            truncated: listing.truncated,
            cursor: listing.cursor,
        }
    }
}
