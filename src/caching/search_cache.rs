//! # Search Cache
//!
//! Query-result pages keyed by the normalized `(text, filters, page, limit)`
//! tuple, plus autocomplete suggestion lists under their own namespace. Both
//! share the 5-minute TTL class.
//!
//! Invalidation is coarse on purpose: search results come from full-text and
//! aggregate queries over arbitrary filter combinations, so any
//! product-affecting write clears the whole namespace rather than computing
//! which cached queries the write touches. The short TTL bounds staleness
//! either way.

use crate::caching::keys::{self, SearchKey, SEARCH_PREFIX, SEARCH_TTL, SUGGESTIONS_PREFIX};
use crate::caching::snapshots::{self, SearchResultPage, SuggestionList};
use crate::caching::store::CacheStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache of search result pages and suggestion lists
#[derive(Clone)]
pub struct SearchCache {
    store: Arc<CacheStore>,
}

impl SearchCache {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// Look up a cached result page for a normalized query tuple
    pub async fn get(&self, key: &SearchKey) -> Option<SearchResultPage> {
        let cache_key = key.cache_key();
        let bytes = self.store.get(&cache_key).await?;

        match snapshots::decode(&bytes) {
            Ok(page) => Some(page),
            Err(e) => {
                warn!("Dropping undecodable search cache entry {}: {}", cache_key, e);
                self.store.delete(&cache_key).await;
                None
            }
        }
    }

    /// Store a result page for a normalized query tuple
    pub async fn put(&self, key: &SearchKey, page: &SearchResultPage) {
        match snapshots::encode(page) {
            Ok(bytes) => {
                self.store
                    .set_with_ttl(&key.cache_key(), &bytes, SEARCH_TTL)
                    .await;
            }
            Err(e) => warn!("Failed to serialize search results for cache: {}", e),
        }
    }

    /// Look up a cached suggestion list for a typed prefix
    pub async fn get_suggestions(&self, prefix: &str) -> Option<SuggestionList> {
        let key = keys::suggestions_key(prefix);
        let bytes = self.store.get(&key).await?;

        match snapshots::decode(&bytes) {
            Ok(list) => Some(list),
            Err(e) => {
                warn!("Dropping undecodable suggestion cache entry {}: {}", key, e);
                self.store.delete(&key).await;
                None
            }
        }
    }

    /// Store a suggestion list for a typed prefix
    pub async fn put_suggestions(&self, prefix: &str, list: &SuggestionList) {
        match snapshots::encode(list) {
            Ok(bytes) => {
                self.store
                    .set_with_ttl(&keys::suggestions_key(prefix), &bytes, SEARCH_TTL)
                    .await;
            }
            Err(e) => warn!("Failed to serialize suggestions for cache: {}", e),
        }
    }

    /// Clear both search namespaces; returns the number of entries removed
    ///
    /// This is the coarse invalidation entry point used for every
    /// product-affecting write.
    pub async fn clear_all(&self) -> usize {
        let pages = self.store.delete_by_prefix(SEARCH_PREFIX).await;
        let suggestions = self.store.delete_by_prefix(SUGGESTIONS_PREFIX).await;
        let total = pages + suggestions;
        if total > 0 {
            debug!("Cleared {} search cache entries", total);
        }
        total
    }
}
