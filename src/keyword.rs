// src/keyword.rs
//! Plain keyword search against the structured API only, with its own 24h store.
//!
//! Unlike the aggregate cache, a stale entry is deleted before the refetch, and
//! an empty fetch leaves nothing behind.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use metrics::counter;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cache::{is_fresh, KeywordCacheEntry, NamedStore};
use crate::ingest::types::{Posting, SearchQuery, SourceProvider};
use crate::rank::paginate;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeywordPage {
    pub jobs: Vec<Posting>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub from_cache: bool,
}

#[derive(Clone)]
pub struct KeywordSearch {
    api: Arc<dyn SourceProvider>,
    cache: NamedStore<KeywordCacheEntry>,
    ttl: chrono::Duration,
}

/// `sha256("<q>-<loc>-<remote>")`, lowercased inputs, first 32 hex chars.
pub fn keyword_key(query: &SearchQuery) -> String {
    let raw = format!(
        "{}-{}-{}",
        query.text.to_lowercase(),
        query.location.as_deref().unwrap_or_default().to_lowercase(),
        query.remote
    );
    let digest = Sha256::digest(raw.as_bytes());
    let mut hex = String::with_capacity(64);
    for b in digest {
        hex.push_str(&format!("{b:02x}"));
    }
    hex.truncate(32);
    hex
}

impl KeywordSearch {
    pub fn new(
        api: Arc<dyn SourceProvider>,
        cache: NamedStore<KeywordCacheEntry>,
        ttl: chrono::Duration,
    ) -> Self {
        Self { api, cache, ttl }
    }

    pub async fn search(&self, query: &SearchQuery, page: usize, limit: usize) -> KeywordPage {
        self.search_at(query, page, limit, Utc::now().naive_utc()).await
    }

    pub async fn search_at(
        &self,
        query: &SearchQuery,
        page: usize,
        limit: usize,
        now: NaiveDateTime,
    ) -> KeywordPage {
        let key = keyword_key(query);
        let store = self.cache.name();

        match self.cache.get(&key) {
            Ok(Some(entry)) if is_fresh(entry.fetched_at, now, self.ttl) => {
                counter!("cache_hits_total", "store" => store).increment(1);
                return page_of(entry.postings, page, limit, true);
            }
            Ok(Some(_)) => {
                tracing::debug!(query_key = %key, "keyword entry expired; deleting");
                if let Err(e) = self.cache.delete(&key) {
                    tracing::warn!(error = ?e, query_key = %key, "failed to delete stale keyword entry");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = ?e, query_key = %key, "keyword cache read failed; treating as miss"),
        }
        counter!("cache_misses_total", "store" => store).increment(1);

        let postings = self.api.fetch(query).await;
        if postings.is_empty() {
            return page_of(Vec::new(), page, limit, false);
        }

        let entry = KeywordCacheEntry {
            query_key: key.clone(),
            postings,
            fetched_at: now,
        };
        if let Err(e) = self.cache.upsert(&key, &entry) {
            tracing::warn!(error = ?e, query_key = %key, "keyword cache write failed");
        }
        page_of(entry.postings, page, limit, false)
    }
}

fn page_of(postings: Vec<Posting>, page: usize, limit: usize, from_cache: bool) -> KeywordPage {
    let (jobs, total, total_pages) = paginate(postings, page, limit);
    KeywordPage {
        jobs,
        page,
        limit,
        total,
        total_pages,
        from_cache,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_case_insensitive_and_fixed_width() {
        let a = keyword_key(&SearchQuery::new("Python", Some("Remote"), true));
        let b = keyword_key(&SearchQuery::new("python", Some("REMOTE"), true));
        let c = keyword_key(&SearchQuery::new("python", Some("remote"), false));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
