// src/aggregate.rs
//! Read-through aggregation over every configured source.
//!
//! On a miss (or a stale entry) all providers are queried concurrently, their
//! output is concatenated in provider order, deduplicated, sorted newest-first
//! and written back with an upsert.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use metrics::counter;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::cache::{is_fresh, CacheEntry, NamedStore, HYBRID_STORE};
use crate::config::AppConfig;
use crate::ingest::dedup::dedupe;
use crate::ingest::providers::{HnJobsProvider, JSearchProvider, RemoteOkProvider, WwrProvider};
use crate::ingest::types::{Posting, SearchQuery, SourceProvider, SourceTag};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregateResult {
    pub postings: Vec<Posting>,
    pub sources_used: Vec<SourceTag>,
    pub from_cache: bool,
}

#[derive(Clone)]
pub struct Aggregator {
    providers: Vec<Arc<dyn SourceProvider>>,
    cache: NamedStore<CacheEntry>,
    ttl: chrono::Duration,
}

impl Aggregator {
    pub fn new(
        providers: Vec<Arc<dyn SourceProvider>>,
        cache: NamedStore<CacheEntry>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            providers,
            cache,
            ttl,
        }
    }

    /// Live adapters for every source, sharing one HTTP client.
    pub fn live_providers(cfg: &AppConfig) -> Result<Vec<Arc<dyn SourceProvider>>> {
        let client = cfg.http_client()?;
        Ok(vec![
            Arc::new(JSearchProvider::from_url(
                cfg.jsearch_url.clone(),
                cfg.rapidapi_key.clone(),
                cfg.rapidapi_host.clone(),
                client.clone(),
                cfg.api_timeout(),
            )),
            Arc::new(RemoteOkProvider::from_url(
                cfg.remoteok_url.clone(),
                client.clone(),
                cfg.feed_timeout(),
            )),
            Arc::new(WwrProvider::from_url(
                cfg.wwr_url.clone(),
                client.clone(),
                cfg.feed_timeout(),
            )),
            Arc::new(HnJobsProvider::from_url(
                cfg.hn_url.clone(),
                client,
                cfg.feed_timeout(),
            )),
        ])
    }

    /// Hybrid store for `cfg`: on disk under `cache_dir` when configured.
    pub fn store_for(cfg: &AppConfig) -> Result<NamedStore<CacheEntry>> {
        match cfg.cache_dir.as_deref() {
            Some(dir) => NamedStore::on_disk(HYBRID_STORE, Path::new(dir)),
            None => Ok(NamedStore::in_memory(HYBRID_STORE)),
        }
    }

    pub fn providers(&self) -> &[Arc<dyn SourceProvider>] {
        &self.providers
    }

    pub async fn get_or_fetch(&self, query: &SearchQuery) -> AggregateResult {
        self.get_or_fetch_at(query, Utc::now().naive_utc()).await
    }

    pub async fn get_or_fetch_at(&self, query: &SearchQuery, now: NaiveDateTime) -> AggregateResult {
        let key = query.cache_key();
        let store = self.cache.name();

        match self.cache.get(&key) {
            Ok(Some(entry)) if is_fresh(entry.fetched_at, now, self.ttl) => {
                counter!("cache_hits_total", "store" => store).increment(1);
                tracing::debug!(query_key = %key, count = entry.postings.len(), "serving cached aggregate");
                return AggregateResult {
                    postings: entry.postings,
                    sources_used: entry.sources_used,
                    from_cache: true,
                };
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = ?e, query_key = %key, "cache read failed; treating as miss"),
        }
        counter!("cache_misses_total", "store" => store).increment(1);

        let (postings, sources_used) = self.fan_out(query).await;
        let mut postings = dedupe(postings);
        sort_newest_first(&mut postings);

        let entry = CacheEntry {
            query_key: key.clone(),
            postings,
            sources_used,
            fetched_at: now,
        };
        if let Err(e) = self.cache.upsert(&key, &entry) {
            tracing::warn!(error = ?e, query_key = %key, "cache write failed");
        }
        tracing::info!(
            query_key = %key,
            count = entry.postings.len(),
            sources = ?entry.sources_used,
            "aggregated fresh postings"
        );

        AggregateResult {
            postings: entry.postings,
            sources_used: entry.sources_used,
            from_cache: false,
        }
    }

    /// Runs every provider to completion; concatenation and provenance follow provider order.
    async fn fan_out(&self, query: &SearchQuery) -> (Vec<Posting>, Vec<SourceTag>) {
        let mut set = JoinSet::new();
        for (idx, provider) in self.providers.iter().enumerate() {
            let provider = Arc::clone(provider);
            let query = query.clone();
            set.spawn(async move { (idx, provider.fetch(&query).await) });
        }

        let mut slots: Vec<Option<Vec<Posting>>> = vec![None; self.providers.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, postings)) => slots[idx] = Some(postings),
                Err(e) => tracing::warn!(error = ?e, "provider task panicked"),
            }
        }

        let mut all = Vec::new();
        let mut sources = Vec::new();
        for (provider, slot) in self.providers.iter().zip(slots) {
            let Some(postings) = slot else { continue };
            if postings.is_empty() {
                continue;
            }
            let tag = provider.tag();
            if !sources.contains(&tag) {
                sources.push(tag);
            }
            all.extend(postings);
        }
        (all, sources)
    }
}

/// Newest first; postings without a timestamp go last. Stable.
pub fn sort_newest_first(postings: &mut [Posting]) {
    postings.sort_by(|a, b| match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
