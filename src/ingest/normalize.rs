// src/ingest/normalize.rs
//! Canonical posting shape plus the small text helpers every adapter shares.

use chrono::{NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::ingest::types::{Posting, RawPosting};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const DEFAULT_LOCATION: &str = "Remote";
pub const DEFAULT_JOB_TYPE: &str = "Full-time";
pub const DEFAULT_APPLY_LINK: &str = "#";

/// Apply defaults and stamp `fetched_at` with the current UTC time.
pub fn normalize(raw: RawPosting) -> Posting {
    normalize_at(raw, Utc::now().naive_utc())
}

/// Same as [`normalize`] with an explicit fetch time.
pub fn normalize_at(raw: RawPosting, fetched_at: NaiveDateTime) -> Posting {
    Posting {
        job_id: raw.job_id,
        title: or_default(raw.title, UNKNOWN_TITLE),
        company: or_default(raw.company, UNKNOWN_COMPANY),
        location: or_default(raw.location, DEFAULT_LOCATION),
        description: raw.description.unwrap_or_default(),
        job_type: or_default(raw.job_type, DEFAULT_JOB_TYPE),
        apply_link: or_default(raw.apply_link, DEFAULT_APPLY_LINK),
        source: raw.source,
        published_at: raw.published_at.map(|dt| dt.naive_utc()),
        fetched_at,
        skills: raw.skills,
        raw_data: raw.raw_data,
    }
}

fn or_default(v: Option<String>, default: &str) -> String {
    match v {
        Some(s) if !s.trim().is_empty() => s,
        _ => default.to_string(),
    }
}

/// Decode HTML entities, strip tags and collapse whitespace.
pub fn clean_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());

    // Feeds often double-encode, so decode before and after tag removal.
    let decoded = html_escape::decode_html_entities(s);
    let stripped = re_tags.replace_all(&decoded, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Firehose relevance check: the whole query phrase, or else every query token,
/// must appear in `text` (case-insensitive). An empty query matches everything.
pub fn matches_query(query: &str, text: &str) -> bool {
    let q = query.trim().to_lowercase();
    let hay = text.to_lowercase();
    if hay.contains(&q) {
        return true;
    }
    q.split_whitespace().all(|part| hay.contains(part))
}

/// Identifier fallback: `<prefix>-<last path segment of link>`, or a title hash
/// when there is no usable link.
pub fn synth_id(prefix: &str, link: Option<&str>, title: &str) -> String {
    let segment = link
        .map(|l| l.trim().trim_end_matches('/'))
        .filter(|l| !l.is_empty())
        .and_then(|l| l.rsplit('/').next())
        .filter(|s| !s.is_empty());
    match segment {
        Some(seg) => format!("{prefix}-{seg}"),
        None => format!("{prefix}-{}", short_hash(title)),
    }
}

/// First 12 hex chars of SHA-256.
pub(crate) fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
