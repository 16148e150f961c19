// src/ingest/providers/wwr.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::ingest::normalize::{clean_text, normalize, synth_id};
use crate::ingest::rss;
use crate::ingest::types::{Posting, RawPosting, SearchQuery, SourceProvider, SourceTag};

pub const DEFAULT_URL: &str = "https://weworkremotely.com/remote-jobs.rss";
const FALLBACK_COMPANY: &str = "WeWorkRemotely";

/// We Work Remotely RSS. The feed honours `?term=`, so only a phrase check is applied locally.
pub struct WwrProvider {
    mode: Mode,
    timeout: Duration,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl WwrProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
            timeout,
        }
    }

    fn parse(xml: &str, query: &str) -> Result<Vec<Posting>> {
        let items = rss::parse_items(xml).context("wwr feed")?;
        let q = query.trim().to_lowercase();
        let mut out = Vec::with_capacity(items.len());
        for it in items {
            let (Some(full_title), Some(link)) = (it.title, it.link) else {
                continue;
            };
            let full_title = full_title.trim().to_string();
            let description = it.description.as_deref().map(clean_text).unwrap_or_default();

            // WWR titles read "Role: Company" (the reverse of RemoteOK).
            let (title, company) = match full_title.split_once(':') {
                Some((t, c)) => (t.trim().to_string(), c.trim().to_string()),
                None => (full_title.clone(), FALLBACK_COMPANY.to_string()),
            };

            if !q.is_empty()
                && !title.to_lowercase().contains(&q)
                && !description.to_lowercase().contains(&q)
            {
                continue;
            }

            let link = link.trim().to_string();
            let mut raw = RawPosting::new(synth_id("wwr", Some(&link), &full_title), SourceTag::Wwr);
            raw.title = Some(title);
            raw.company = Some(company);
            raw.location = Some("Remote".to_string());
            raw.description = Some(description);
            raw.apply_link = Some(link);
            raw.published_at = it.pub_date.as_deref().and_then(rss::parse_pub_date);
            raw.raw_data = json!({ "rss_title": full_title });
            out.push(normalize(raw));
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for WwrProvider {
    fn tag(&self) -> SourceTag {
        SourceTag::Wwr
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_fetch(&self, query: &SearchQuery) -> Result<Vec<Posting>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse(s, &query.text),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .query(&[("term", query.text.as_str())])
                    .send()
                    .await
                    .context("wwr http get()")?
                    .error_for_status()
                    .context("wwr non-2xx")?
                    .text()
                    .await
                    .context("wwr http .text()")?;
                Self::parse(&body, &query.text)
            }
        }
    }
}
