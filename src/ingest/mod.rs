// src/ingest/mod.rs
pub mod dedup;
pub mod normalize;
pub mod providers;
pub mod rss;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

pub use dedup::dedupe;
pub use normalize::{clean_text, matches_query, normalize, normalize_at};
pub use types::{Posting, RawPosting, SearchQuery, SourceProvider, SourceTag};

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_histogram!("provider_fetch_ms", "Per-source fetch+parse time in milliseconds.");
        describe_counter!(
            "provider_errors_total",
            "Source fetch/parse failures and timeouts (absorbed)."
        );
        describe_counter!(
            "provider_postings_total",
            "Postings returned by each source after local filtering."
        );
        describe_counter!(
            "dedup_dropped_total",
            "Postings removed as cross-source duplicates."
        );
        describe_counter!("cache_hits_total", "Fresh cache entries served.");
        describe_counter!("cache_misses_total", "Missing or stale cache entries.");
        describe_gauge!("cache_ttl_hours", "Configured freshness window per cache store.");
        describe_counter!(
            "fallback_queries_total",
            "Profile searches that needed the broader fallback query."
        );
    });
}
