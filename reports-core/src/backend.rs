//! Search backend boundary and an in-memory implementation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::definition::{ACCESS_LIST_FIELD, LAST_UPDATED_TIME_FIELD};
use crate::error::BackendError;

/// Sort direction on the ordering field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Query issued by list handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Only documents whose access list shares an entry with this list
    /// match. `None` disables filtering.
    pub access_filter: Option<Vec<String>>,
    pub sort_field: &'static str,
    pub sort_order: SortOrder,
}

impl SearchQuery {
    /// Newest first, optionally restricted to the given access entries.
    pub fn latest_first(access_filter: Option<Vec<String>>) -> Self {
        Self {
            access_filter,
            sort_field: LAST_UPDATED_TIME_FIELD,
            sort_order: SortOrder::Descending,
        }
    }
}

/// One stored document, keyed by its backend id.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub source: Value,
}

/// Document returned by a point lookup.
pub type RawDocument = SearchHit;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResponse {
    /// Matches across all pages.
    pub total_hits: u64,
    pub hits: Vec<SearchHit>,
}

/// Document-search engine the handlers talk to.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Page through matching documents.
    async fn search(
        &self,
        index: &str,
        query: &SearchQuery,
        from: u64,
        size: u32,
    ) -> Result<SearchResponse, BackendError>;

    async fn get_by_id(&self, index: &str, id: &str) -> Result<Option<RawDocument>, BackendError>;

    /// Returns `false` when nothing was stored under `id`.
    async fn delete_by_id(&self, index: &str, id: &str) -> Result<bool, BackendError>;

    /// Store or replace a document.
    async fn index(&self, index: &str, id: &str, source: Value) -> Result<(), BackendError>;
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

type IndexMap = HashMap<String, BTreeMap<String, Value>>;

/// In-memory search backend.
#[derive(Debug, Default, Clone)]
pub struct InMemorySearchBackend {
    indices: Arc<RwLock<IndexMap>>,
}

fn poisoned<T>(_: T) -> BackendError {
    BackendError::Unavailable {
        reason: "in-memory index lock poisoned".to_string(),
    }
}

fn matches_filter(source: &Value, filter: &[String]) -> bool {
    source
        .get(ACCESS_LIST_FIELD)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .any(|entry| filter.iter().any(|f| f == entry))
        })
        .unwrap_or(false)
}

fn sort_key(source: &Value, field: &str) -> Option<i64> {
    source.get(field).and_then(Value::as_i64)
}

impl InMemorySearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored in `index`.
    pub fn len(&self, index: &str) -> Result<usize, BackendError> {
        let indices = self.indices.read().map_err(poisoned)?;
        Ok(indices.get(index).map(BTreeMap::len).unwrap_or(0))
    }

    pub fn clear(&self) -> Result<(), BackendError> {
        self.indices.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for InMemorySearchBackend {
    async fn search(
        &self,
        index: &str,
        query: &SearchQuery,
        from: u64,
        size: u32,
    ) -> Result<SearchResponse, BackendError> {
        let indices = self.indices.read().map_err(poisoned)?;
        let Some(documents) = indices.get(index) else {
            return Ok(SearchResponse::default());
        };

        let mut matched: Vec<(&String, &Value)> = documents
            .iter()
            .filter(|(_, source)| match &query.access_filter {
                Some(filter) => matches_filter(source, filter),
                None => true,
            })
            .collect();
        matched.sort_by(|(a_id, a), (b_id, b)| {
            let by_field = sort_key(a, query.sort_field).cmp(&sort_key(b, query.sort_field));
            let by_field = match query.sort_order {
                SortOrder::Ascending => by_field,
                SortOrder::Descending => by_field.reverse(),
            };
            // Stable across calls so pages never overlap.
            match by_field {
                Ordering::Equal => a_id.cmp(b_id),
                other => other,
            }
        });

        let total_hits = matched.len() as u64;
        let skip = usize::try_from(from).unwrap_or(usize::MAX);
        let hits = matched
            .into_iter()
            .skip(skip)
            .take(size as usize)
            .map(|(id, source)| SearchHit {
                id: id.clone(),
                source: source.clone(),
            })
            .collect();
        Ok(SearchResponse { total_hits, hits })
    }

    async fn get_by_id(&self, index: &str, id: &str) -> Result<Option<RawDocument>, BackendError> {
        let indices = self.indices.read().map_err(poisoned)?;
        Ok(indices
            .get(index)
            .and_then(|documents| documents.get(id))
            .map(|source| SearchHit {
                id: id.to_string(),
                source: source.clone(),
            }))
    }

    async fn delete_by_id(&self, index: &str, id: &str) -> Result<bool, BackendError> {
        let mut indices = self.indices.write().map_err(poisoned)?;
        Ok(indices
            .get_mut(index)
            .and_then(|documents| documents.remove(id))
            .is_some())
    }

    async fn index(&self, index: &str, id: &str, source: Value) -> Result<(), BackendError> {
        let mut indices = self.indices.write().map_err(poisoned)?;
        indices
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), source);
        Ok(())
    }
}
