// tests/common/mod.rs
//
// Shared helpers for integration tests: fixture-backed providers, hand-written
// mock providers and posting builders.
#![allow(dead_code)]

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use job_aggregator::ingest::normalize::normalize_at;
use job_aggregator::ingest::providers::{HnJobsProvider, JSearchProvider, RemoteOkProvider, WwrProvider};
use job_aggregator::ingest::types::{Posting, RawPosting, SearchQuery, SourceProvider, SourceTag};

pub fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|e| panic!("missing tests/fixtures/{name}: {e}"))
}

/// All four sources backed by on-disk fixtures, in the order the service uses.
pub fn fixture_providers() -> Vec<Arc<dyn SourceProvider>> {
    vec![
        Arc::new(JSearchProvider::from_fixture_str(&fixture("jsearch.json"))),
        Arc::new(RemoteOkProvider::from_fixture_str(&fixture("remoteok_rss.xml"))),
        Arc::new(WwrProvider::from_fixture_str(&fixture("wwr_rss.xml"))),
        Arc::new(HnJobsProvider::from_fixture_str(&fixture("hn_jobs.html"))),
    ]
}

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn posting(id: &str, source: SourceTag, title: &str, company: &str) -> Posting {
    let mut raw = RawPosting::new(id, source);
    raw.title = Some(title.to_string());
    raw.company = Some(company.to_string());
    raw.description = Some(format!("{title} at {company}"));
    raw.apply_link = Some(format!("https://jobs.test/{id}"));
    normalize_at(raw, at(1, 0))
}

/// Returns canned postings for queries containing `keyword` (or every query when
/// `keyword` is empty) and counts calls.
pub struct MockProvider {
    pub tag: SourceTag,
    pub keyword: String,
    pub postings: Vec<Posting>,
    pub calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(tag: SourceTag, postings: Vec<Posting>) -> Self {
        Self {
            tag,
            keyword: String::new(),
            postings,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn for_keyword(tag: SourceTag, keyword: &str, postings: Vec<Posting>) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            ..Self::new(tag, postings)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceProvider for MockProvider {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn try_fetch(&self, query: &SearchQuery) -> Result<Vec<Posting>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.keyword.is_empty() || query.text.to_lowercase().contains(&self.keyword) {
            Ok(self.postings.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

/// Always errors.
pub struct FailingProvider(pub SourceTag);

#[async_trait]
impl SourceProvider for FailingProvider {
    fn tag(&self) -> SourceTag {
        self.0
    }

    async fn try_fetch(&self, _query: &SearchQuery) -> Result<Vec<Posting>> {
        Err(anyhow!("upstream returned 503"))
    }
}

/// Sleeps past its own timeout.
pub struct StallingProvider {
    pub tag: SourceTag,
    pub delay: Duration,
    pub budget: Duration,
}

#[async_trait]
impl SourceProvider for StallingProvider {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    fn timeout(&self) -> Duration {
        self.budget
    }

    async fn try_fetch(&self, _query: &SearchQuery) -> Result<Vec<Posting>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![posting("late-1", self.tag, "Late Posting", "Slowpoke")])
    }
}
