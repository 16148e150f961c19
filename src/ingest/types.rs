// src/ingest/types.rs
use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

/// Default per-call budget for an adapter when it does not override `timeout()`.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Known job sources. Serialized as the lowercase tag (`"api"`, `"remoteok"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Api,
    RemoteOk,
    Wwr,
    Hn,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Api => "api",
            SourceTag::RemoteOk => "remoteok",
            SourceTag::Wwr => "wwr",
            SourceTag::Hn => "hn",
        }
    }

    /// Lower value wins when two sources carry the same posting.
    pub fn priority(&self) -> u8 {
        match self {
            SourceTag::Api => 0,
            SourceTag::Wwr => 1,
            SourceTag::RemoteOk => 2,
            SourceTag::Hn => 3,
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical job record after normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Posting {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub job_type: String,
    pub apply_link: String,
    pub source: SourceTag,
    /// UTC, no offset.
    pub published_at: Option<NaiveDateTime>,
    pub fetched_at: NaiveDateTime,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Source payload kept for audit/debugging.
    #[serde(default)]
    pub raw_data: serde_json::Value,
}

/// Source-specific fields before defaults are applied.
#[derive(Debug, Clone)]
pub struct RawPosting {
    pub job_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub job_type: Option<String>,
    pub apply_link: Option<String>,
    pub source: SourceTag,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub skills: Vec<String>,
    pub raw_data: serde_json::Value,
}

impl RawPosting {
    pub fn new(job_id: impl Into<String>, source: SourceTag) -> Self {
        Self {
            job_id: job_id.into(),
            title: None,
            company: None,
            location: None,
            description: None,
            job_type: None,
            apply_link: None,
            source,
            published_at: None,
            skills: Vec::new(),
            raw_data: serde_json::Value::Null,
        }
    }
}

/// What the caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub location: Option<String>,
    pub remote: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, location: Option<&str>, remote: bool) -> Self {
        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        Self {
            text: text.into(),
            location,
            remote,
        }
    }

    /// Deterministic, case-insensitive key used by the aggregate cache.
    pub fn cache_key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.text.to_lowercase(),
            self.location.as_deref().unwrap_or_default().to_lowercase(),
            self.remote
        )
    }
}

/// One external job source.
///
/// Implementors only write `try_fetch`. Callers go through `fetch`, which never
/// fails: errors and timeouts are logged, counted and turned into an empty list.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    fn tag(&self) -> SourceTag;

    fn timeout(&self) -> Duration {
        DEFAULT_PROVIDER_TIMEOUT
    }

    async fn try_fetch(&self, query: &SearchQuery) -> Result<Vec<Posting>>;

    async fn fetch(&self, query: &SearchQuery) -> Vec<Posting> {
        let source = self.tag().as_str();
        let t0 = Instant::now();
        let out = match tokio::time::timeout(self.timeout(), self.try_fetch(query)).await {
            Ok(Ok(postings)) => postings,
            Ok(Err(e)) => {
                tracing::warn!(error = ?e, source, "provider error");
                counter!("provider_errors_total", "source" => source).increment(1);
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(source, timeout_ms = self.timeout().as_millis() as u64, "provider timed out");
                counter!("provider_errors_total", "source" => source).increment(1);
                Vec::new()
            }
        };
        histogram!("provider_fetch_ms", "source" => source)
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("provider_postings_total", "source" => source).increment(out.len() as u64);
        out
    }
}
