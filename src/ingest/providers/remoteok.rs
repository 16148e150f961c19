// src/ingest/providers/remoteok.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::ingest::normalize::{clean_text, matches_query, normalize, synth_id};
use crate::ingest::rss;
use crate::ingest::types::{Posting, RawPosting, SearchQuery, SourceProvider, SourceTag};

pub const DEFAULT_URL: &str = "https://remoteok.com/remote-jobs.rss";
const FALLBACK_COMPANY: &str = "RemoteOK";

/// RemoteOK publishes its whole board as one RSS feed; filtering happens here.
pub struct RemoteOkProvider {
    mode: Mode,
    timeout: Duration,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RemoteOkProvider {
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
        let items = rss::parse_items(xml).context("remoteok feed")?;
        let mut out = Vec::with_capacity(items.len());
        for it in items {
            let (Some(full_title), Some(link)) = (it.title, it.link) else {
                continue;
            };
            let full_title = clean_text(&full_title);
            let description = it.description.as_deref().map(clean_text).unwrap_or_default();

            if !matches_query(query, &format!("{full_title} {description}")) {
                continue;
            }

            // Feed titles read "Company: Role"; bare titles get a placeholder company.
            let (company, title) = match full_title.split_once(':') {
                Some((c, t)) => (c.trim().to_string(), t.trim().to_string()),
                None => (FALLBACK_COMPANY.to_string(), full_title.clone()),
            };

            let link = link.trim().to_string();
            let mut raw = RawPosting::new(
                synth_id("remoteok", Some(&link), &full_title),
                SourceTag::RemoteOk,
            );
            raw.title = Some(title);
            raw.company = Some(company);
            raw.location = Some("Remote".to_string());
            raw.description = Some(description);
            raw.apply_link = Some(link);
            raw.published_at = it.pub_date.as_deref().and_then(rss::parse_pub_date);
            raw.raw_data = json!({ "rss_title": full_title });
            out.push(normalize(raw));
        }
        tracing::debug!(source = "remoteok", query, count = out.len(), "feed parsed");
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RemoteOkProvider {
    fn tag(&self) -> SourceTag {
        SourceTag::RemoteOk
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
                    .send()
                    .await
                    .context("remoteok http get()")?
                    .error_for_status()
                    .context("remoteok non-2xx")?
                    .text()
                    .await
                    .context("remoteok http .text()")?;
                Self::parse(&body, &query.text)
            }
        }
    }
}
