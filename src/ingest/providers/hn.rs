// src/ingest/providers/hn.rs
//! Hacker News jobs board. The page is HTML, not a feed, and titles are free text,
//! so company/role are guessed from "X is hiring Y" or "X: Y".

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::ingest::normalize::{clean_text, matches_query, normalize, synth_id};
use crate::ingest::types::{Posting, RawPosting, SearchQuery, SourceProvider, SourceTag};

pub const DEFAULT_URL: &str = "https://news.ycombinator.com/jobs";
const BASE_URL: &str = "https://news.ycombinator.com/";
const FALLBACK_COMPANY: &str = "HackerNews Job";

/// Listing rows only (`<tr class="athing ...">`); layout rows and the outer table are skipped.
static RE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<tr\b([^>]*\bathing\b[^>]*)>(.*?)</tr>").unwrap());
static RE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bid\s*=\s*"([^"]*)""#).unwrap());
static RE_TITLELINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span[^>]*class\s*=\s*"titleline"[^>]*>\s*<a\b[^>]*?href\s*=\s*"([^"]*)"[^>]*>(.*?)</a>"#)
        .unwrap()
});

pub struct HnJobsProvider {
    mode: Mode,
    timeout: Duration,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl HnJobsProvider {
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

    fn parse(html: &str, query: &str) -> Vec<Posting> {
        let mut out = Vec::new();
        for row in RE_ROW.captures_iter(html) {
            let attrs = &row[1];
            let Some(caps) = RE_TITLELINE.captures(&row[2]) else {
                continue;
            };
            let full_text = clean_text(&caps[2]);
            if full_text.is_empty() || !matches_query(query, &full_text) {
                continue;
            }

            let href = html_escape::decode_html_entities(caps[1].trim()).to_string();
            let link = if href.starts_with("http") {
                href
            } else {
                format!("{BASE_URL}{}", href.trim_start_matches('/'))
            };

            let (company, title) = split_company_title(&full_text);
            let job_id = match RE_ID.captures(attrs) {
                Some(id) if !id[1].trim().is_empty() => format!("hn-{}", id[1].trim()),
                _ => synth_id("hn", Some(&link), &full_text),
            };

            let mut raw = RawPosting::new(job_id, SourceTag::Hn);
            raw.title = Some(title);
            raw.company = Some(company);
            // Most HN listings are remote-friendly; the board does not say.
            raw.location = Some("Remote".to_string());
            raw.description = Some(full_text.clone());
            raw.apply_link = Some(link);
            raw.raw_data = json!({ "raw_title": full_text });
            out.push(normalize(raw));
        }
        out
    }
}

/// "Acme (YC W21) is hiring Rust engineers" -> ("Acme (YC W21)", "Rust engineers")
/// "Acme: Founding Engineer" -> ("Acme", "Founding Engineer")
fn split_company_title(full_text: &str) -> (String, String) {
    if full_text.contains(" is hiring ") {
        let mut parts = full_text.split(" is hiring ");
        let company = parts.next().unwrap_or_default().trim().to_string();
        let title = parts.next().unwrap_or(full_text).trim().to_string();
        return (company, title);
    }
    if let Some((company, title)) = full_text.split_once(':') {
        return (company.trim().to_string(), title.trim().to_string());
    }
    (FALLBACK_COMPANY.to_string(), full_text.to_string())
}

#[async_trait]
impl SourceProvider for HnJobsProvider {
    fn tag(&self) -> SourceTag {
        SourceTag::Hn
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_fetch(&self, query: &SearchQuery) -> Result<Vec<Posting>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(Self::parse(s, &query.text)),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("hn http get()")?
                    .error_for_status()
                    .context("hn non-2xx")?
                    .text()
                    .await
                    .context("hn http .text()")?;
                Ok(Self::parse(&body, &query.text))
            }
        }
    }
}
