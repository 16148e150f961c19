// src/ingest/dedup.rs
//! Cross-source duplicate removal.
//!
//! Postings are ordered by source priority (stable, so ties keep arrival order),
//! then a single pass drops anything whose apply link or `(title, company)` pair
//! was already seen. Content similarity is not considered.

use std::collections::HashSet;

use metrics::counter;

use crate::ingest::types::Posting;

pub fn dedupe(mut postings: Vec<Posting>) -> Vec<Posting> {
    let before = postings.len();
    postings.sort_by_key(|p| p.source.priority());

    let mut seen_links: HashSet<String> = HashSet::new();
    let mut seen_title_company: HashSet<(String, String)> = HashSet::new();
    let mut keep = Vec::with_capacity(postings.len());

    for p in postings {
        if seen_links.contains(&p.apply_link) {
            continue;
        }
        let key = (
            p.title.trim().to_lowercase(),
            p.company.trim().to_lowercase(),
        );
        if seen_title_company.contains(&key) {
            continue;
        }
        seen_links.insert(p.apply_link.clone());
        seen_title_company.insert(key);
        keep.push(p);
    }

    let dropped = before - keep.len();
    if dropped > 0 {
        counter!("dedup_dropped_total").increment(dropped as u64);
    }
    keep
}
