//! # Cached Value Types
//!
//! Explicit tagged value types per cache namespace. Each namespace
//! (de)serializes exactly one of these, so a schema change in one namespace
//! cannot silently corrupt another. A snapshot is plain data: it carries no
//! live document behavior and is only as fresh as its TTL class allows.

use crate::caching::{CacheError, CacheResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A cached view of a single product (`product:` namespace)
///
/// Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub price: u64,
    pub stock: u32,
    pub image_url: String,
}

/// One line item inside a cached cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemSnapshot {
    pub product_id: String,
    pub name: String,
    pub image_url: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub line_total: u64,
}

/// A cached view of a user's formatted cart (`cart:` namespace)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub user_id: String,
    pub items: Vec<CartItemSnapshot>,
    pub total_amount: u64,
    pub total_items: usize,
}

/// A cached page of search results (`search:` namespace)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultPage {
    pub products: Vec<ProductSnapshot>,
    pub total_results: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// A cached list of autocomplete terms (`suggestions:` namespace)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionList {
    pub terms: Vec<String>,
}

/// Serialize a snapshot for storage
pub fn encode<T: Serialize>(value: &T) -> CacheResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(CacheError::Serialization)
}

/// Deserialize a stored snapshot
///
/// A decode failure means the entry was written under a different schema or
/// corrupted in transit; callers treat it as a miss and drop the entry.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CacheResult<T> {
    serde_json::from_slice(bytes).map_err(CacheError::Serialization)
}
