//! Shared, read-only handles passed to every handler.

use crate::services::{
    asset_service::AssetFetcher, storage_service::ObjectStore, token_service::TokenAuthority,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub objects: Arc<dyn ObjectStore>,
    pub tokens: TokenAuthority,
    /// `None` when no UI is deployed; the app-shell fallback then answers 404.
    pub assets: Option<Arc<dyn AssetFetcher>>,
}

impl AppState {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        tokens: TokenAuthority,
        assets: Option<Arc<dyn AssetFetcher>>,
    ) -> Self {
        Self {
            objects,
            tokens,
            assets,
        }
    }
}
