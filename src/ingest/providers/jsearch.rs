// src/ingest/providers/jsearch.rs
//! Structured search API (JSearch on RapidAPI). Fields map one-to-one onto the
//! canonical posting; no local relevance filtering is needed.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

use crate::ingest::normalize::{normalize, synth_id};
use crate::ingest::types::{Posting, RawPosting, SearchQuery, SourceProvider, SourceTag};

pub const DEFAULT_URL: &str = "https://jsearch.p.rapidapi.com/search";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Item {
    job_id: Option<String>,
    job_title: Option<String>,
    employer_name: Option<String>,
    job_city: Option<String>,
    job_country: Option<String>,
    job_description: Option<String>,
    job_apply_link: Option<String>,
    job_employment_type: Option<String>,
    job_posted_at_datetime_utc: Option<String>,
}

pub struct JSearchProvider {
    mode: Mode,
    timeout: Duration,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        api_key: String,
        api_host: String,
        client: reqwest::Client,
    },
}

impl JSearchProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_url(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_host: impl Into<String>,
        client: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                api_key: api_key.into(),
                api_host: api_host.into(),
                client,
            },
            timeout,
        }
    }

    /// `"<query> in <location>"` when a location is given.
    pub fn search_text(query: &SearchQuery) -> String {
        match &query.location {
            Some(loc) => format!("{} in {}", query.text, loc),
            None => query.text.clone(),
        }
    }

    fn request_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", Self::search_text(query)),
            ("page", "1".to_string()),
            ("num_pages", "1".to_string()),
        ];
        if query.remote {
            params.push(("remote_jobs_only", "true".to_string()));
        }
        params
    }

    fn parse(body: &str) -> Result<Vec<Posting>> {
        let env: Envelope = serde_json::from_str(body).context("parsing jsearch json")?;
        let Some(rows) = env.data else {
            tracing::warn!(source = "api", "jsearch response has no `data` key");
            return Ok(Vec::new());
        };

        let mut out = Vec::with_capacity(rows.len());
        for value in rows {
            let item: Item = match serde_json::from_value(value.clone()) {
                Ok(it) => it,
                Err(e) => {
                    tracing::debug!(error = ?e, "skipping malformed jsearch row");
                    continue;
                }
            };
            let location = format!(
                "{}, {}",
                item.job_city.as_deref().unwrap_or_default(),
                item.job_country.as_deref().unwrap_or_default()
            )
            .trim_matches(|c| c == ',' || c == ' ')
            .to_string();

            let job_id = match item.job_id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => synth_id(
                    "api",
                    item.job_apply_link.as_deref(),
                    item.job_title.as_deref().unwrap_or_default(),
                ),
            };
            let mut raw = RawPosting::new(job_id, SourceTag::Api);
            raw.title = item.job_title;
            raw.company = item.employer_name;
            raw.location = Some(location);
            raw.description = item.job_description;
            raw.apply_link = item.job_apply_link;
            raw.job_type = item.job_employment_type;
            raw.published_at = item
                .job_posted_at_datetime_utc
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
            raw.raw_data = value;
            out.push(normalize(raw));
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for JSearchProvider {
    fn tag(&self) -> SourceTag {
        SourceTag::Api
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_fetch(&self, query: &SearchQuery) -> Result<Vec<Posting>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse(s),
            Mode::Http {
                url,
                api_key,
                api_host,
                client,
            } => {
                if api_key.is_empty() {
                    tracing::warn!(source = "api", "RapidAPI key not configured");
                    return Ok(Vec::new());
                }
                let params = Self::request_params(query);
                tracing::info!(source = "api", query = %params[0].1, "fetching jsearch jobs");
                let body = client
                    .get(url)
                    .header("x-rapidapi-key", api_key)
                    .header("x-rapidapi-host", api_host)
                    .query(&params)
                    .send()
                    .await
                    .context("jsearch http get()")?
                    .error_for_status()
                    .context("jsearch non-2xx")?
                    .text()
                    .await
                    .context("jsearch http .text()")?;
                Self::parse(&body)
            }
        }
    }
}
