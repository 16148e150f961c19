// tests/aggregate_cache.rs
//
// Orchestrator behaviour end to end with fixture and mock providers:
// fan-out, provenance, dedup priority, recency order, TTL boundary, failure
// isolation and the persisted round trip.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Duration as TtlDuration;

use common::{at, fixture_providers, posting, FailingProvider, MockProvider, StallingProvider};
use job_aggregator::aggregate::Aggregator;
use job_aggregator::cache::{CacheEntry, NamedStore, HYBRID_STORE};
use job_aggregator::ingest::types::{SearchQuery, SourceProvider, SourceTag};

fn six_hours() -> TtlDuration {
    TtlDuration::hours(6)
}

#[tokio::test]
async fn fixtures_are_merged_deduped_and_sorted() {
    let agg = Aggregator::new(fixture_providers(), NamedStore::in_memory(HYBRID_STORE), six_hours());
    let out = agg
        .get_or_fetch_at(&SearchQuery::new("rust", None, true), at(6, 0))
        .await;

    assert!(!out.from_cache);
    assert_eq!(
        out.sources_used,
        vec![SourceTag::Api, SourceTag::RemoteOk, SourceTag::Wwr, SourceTag::Hn]
    );

    let ids: Vec<_> = out.postings.iter().map(|p| p.job_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "FeRrOuS01==",
            "wwr-corrode-rust-engineer",
            "wwr-crab-systems-rust-platform-engineer",
            "OxIdE02==",
            "ToKiO03==",
            "hn-4001",
            "hn-4003",
        ],
        "api copy beats remoteok, wwr beats remoteok, undated postings last"
    );
    assert!(out.postings.iter().all(|p| p.source != SourceTag::RemoteOk));
}

#[tokio::test]
async fn ttl_boundary_serves_then_refetches() {
    let api = Arc::new(MockProvider::new(
        SourceTag::Api,
        vec![posting("a-1", SourceTag::Api, "Rust Engineer", "Acme")],
    ));
    let providers: Vec<Arc<dyn SourceProvider>> = vec![api.clone()];
    let agg = Aggregator::new(providers, NamedStore::in_memory(HYBRID_STORE), six_hours());
    let q = SearchQuery::new("Rust", Some("Berlin"), false);

    let t0 = at(10, 0);
    let first = agg.get_or_fetch_at(&q, t0).await;
    assert!(!first.from_cache);
    assert_eq!(api.calls(), 1);

    let just_before = t0 + six_hours() - TtlDuration::seconds(1);
    let hit = agg.get_or_fetch_at(&q, just_before).await;
    assert!(hit.from_cache);
    assert_eq!(hit.postings, first.postings);
    assert_eq!(api.calls(), 1);

    // key is case-insensitive
    let hit = agg
        .get_or_fetch_at(&SearchQuery::new("rust", Some("BERLIN"), false), just_before)
        .await;
    assert!(hit.from_cache);

    let just_after = t0 + six_hours() + TtlDuration::seconds(1);
    let refreshed = agg.get_or_fetch_at(&q, just_after).await;
    assert!(!refreshed.from_cache);
    assert_eq!(api.calls(), 2);
}

#[tokio::test]
async fn failing_and_stalled_sources_contribute_nothing() {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(FailingProvider(SourceTag::Api)),
        Arc::new(StallingProvider {
            tag: SourceTag::Wwr,
            delay: Duration::from_secs(5),
            budget: Duration::from_millis(100),
        }),
        Arc::new(MockProvider::new(
            SourceTag::Hn,
            vec![posting("hn-1", SourceTag::Hn, "Rust Hacker", "Zeta")],
        )),
    ];
    let agg = Aggregator::new(providers, NamedStore::in_memory(HYBRID_STORE), six_hours());

    let started = Instant::now();
    let out = agg.get_or_fetch_at(&SearchQuery::new("rust", None, true), at(2, 0)).await;

    assert!(started.elapsed() < Duration::from_secs(2), "stalled source must be cut off");
    assert_eq!(out.sources_used, vec![SourceTag::Hn]);
    assert_eq!(out.postings.len(), 1);
}

#[tokio::test]
async fn providers_run_concurrently() {
    let slow = |tag| -> Arc<dyn SourceProvider> {
        Arc::new(StallingProvider {
            tag,
            delay: Duration::from_millis(300),
            budget: Duration::from_secs(5),
        })
    };
    let agg = Aggregator::new(
        vec![slow(SourceTag::Api), slow(SourceTag::RemoteOk), slow(SourceTag::Wwr), slow(SourceTag::Hn)],
        NamedStore::in_memory(HYBRID_STORE),
        six_hours(),
    );

    let started = Instant::now();
    let out = agg.get_or_fetch_at(&SearchQuery::new("x", None, true), at(3, 0)).await;
    assert!(
        started.elapsed() < Duration::from_millis(1000),
        "four 300ms sources should overlap, took {:?}",
        started.elapsed()
    );
    assert_eq!(out.sources_used.len(), 4);
    // identical title/company from every source collapses to the api copy
    assert_eq!(out.postings.len(), 1);
    assert_eq!(out.postings[0].source, SourceTag::Api);
}

#[tokio::test]
async fn empty_result_is_cached_and_valid() {
    let agg = Aggregator::new(
        vec![Arc::new(FailingProvider(SourceTag::Api)) as Arc<dyn SourceProvider>],
        NamedStore::in_memory(HYBRID_STORE),
        six_hours(),
    );
    let q = SearchQuery::new("cobol", None, false);
    let out = agg.get_or_fetch_at(&q, at(4, 0)).await;
    assert!(out.postings.is_empty());
    assert!(out.sources_used.is_empty());

    let again = agg.get_or_fetch_at(&q, at(4, 1)).await;
    assert!(again.from_cache);
}

#[tokio::test]
async fn file_backed_entries_survive_a_new_aggregator() {
    let dir = tempfile::tempdir().unwrap();
    let q = SearchQuery::new("rust", None, true);

    let store: NamedStore<CacheEntry> = NamedStore::on_disk(HYBRID_STORE, dir.path()).unwrap();
    let first = Aggregator::new(fixture_providers(), store, six_hours())
        .get_or_fetch_at(&q, at(6, 0))
        .await;

    let api = Arc::new(MockProvider::new(SourceTag::Api, vec![]));
    let reopened: NamedStore<CacheEntry> = NamedStore::on_disk(HYBRID_STORE, dir.path()).unwrap();
    let second = Aggregator::new(vec![api.clone() as Arc<dyn SourceProvider>], reopened, six_hours())
        .get_or_fetch_at(&q, at(6, 2))
        .await;

    assert!(second.from_cache);
    assert_eq!(api.calls(), 0);
    assert_eq!(second.postings, first.postings, "rehydrated postings are field-identical");
    assert_eq!(second.sources_used, first.sources_used);
}
