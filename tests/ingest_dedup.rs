// tests/ingest_dedup.rs
//
// Cross-source dedup over a mixed batch: no two survivors share a link or a
// (title, company) pair, the pass is idempotent, and higher-priority sources win.

mod common;

use std::collections::HashSet;

use common::posting;
use job_aggregator::ingest::dedup::dedupe;
use job_aggregator::ingest::types::{Posting, SourceTag};

fn with_link(mut p: Posting, link: &str) -> Posting {
    p.apply_link = link.to_string();
    p
}

fn mixed_batch() -> Vec<Posting> {
    vec![
        posting("hn-1", SourceTag::Hn, "Rust Engineer", "Acme"),
        posting("wwr-1", SourceTag::Wwr, "Rust Engineer", "ACME "),
        with_link(
            posting("ro-1", SourceTag::RemoteOk, "Platform Engineer", "Globex"),
            "https://jobs.test/shared",
        ),
        with_link(
            posting("api-1", SourceTag::Api, "Backend Developer", "Initech"),
            "https://jobs.test/shared",
        ),
        posting("api-2", SourceTag::Api, " rust engineer", "acme"),
        posting("wwr-2", SourceTag::Wwr, "Embedded Rust Engineer", "Corrode"),
        posting("hn-2", SourceTag::Hn, "Embedded Rust Engineer", "Corrode Ltd"),
    ]
}

#[test]
fn survivors_are_pairwise_distinct() {
    let out = dedupe(mixed_batch());

    let links: HashSet<_> = out.iter().map(|p| p.apply_link.clone()).collect();
    let pairs: HashSet<_> = out
        .iter()
        .map(|p| (p.title.trim().to_lowercase(), p.company.trim().to_lowercase()))
        .collect();
    assert_eq!(links.len(), out.len());
    assert_eq!(pairs.len(), out.len());
}

#[test]
fn priority_decides_which_copy_survives() {
    let out = dedupe(mixed_batch());
    let ids: Vec<_> = out.iter().map(|p| p.job_id.as_str()).collect();

    // api first, then remoteok, wwr, hn; arrival order within a source
    assert_eq!(ids, vec!["api-1", "api-2", "wwr-2", "hn-2"]);
}

#[test]
fn dedupe_is_idempotent() {
    let once = dedupe(mixed_batch());
    let twice = dedupe(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn postings_without_links_collapse_on_the_placeholder() {
    let out = dedupe(vec![
        with_link(posting("a", SourceTag::Hn, "Rust Engineer", "Acme"), "#"),
        with_link(posting("b", SourceTag::Hn, "Go Engineer", "Globex"), "#"),
    ]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].job_id, "a");
}
