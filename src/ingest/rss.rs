// src/ingest/rss.rs
//! Minimal RSS 2.0 shape shared by the feed adapters. Each adapter still owns
//! its own title/company splitting.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use quick_xml::de::from_str;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub struct Item {
    pub title: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    pub description: Option<String>,
}

pub fn parse_items(xml: &str) -> Result<Vec<Item>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
    Ok(rss.channel.item)
}

/// RFC 2822 (`Wed, 02 Oct 2002 13:00:00 +0000`). Unparseable dates are dropped.
pub fn parse_pub_date(ts: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(ts.trim()).ok()
}

// HTML named entities are not valid XML; feeds still ship them.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
