// src/rank.rs
//! Ordering and pagination of scored result sets.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::scoring::ScoredPosting;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Score descending; ties keep their incoming order.
    #[default]
    Match,
    /// `posted_date` string descending; undated last.
    Latest,
    /// No salary data is parsed yet, so this leaves the order untouched.
    Salary,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Match => "match",
            SortKey::Latest => "latest",
            SortKey::Salary => "salary",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "match" => Ok(SortKey::Match),
            "latest" => Ok(SortKey::Latest),
            "salary" => Ok(SortKey::Salary),
            other => Err(anyhow!("unknown sort key `{other}` (expected match|latest|salary)")),
        }
    }
}

pub fn rank(mut scored: Vec<ScoredPosting>, key: SortKey) -> Vec<ScoredPosting> {
    match key {
        SortKey::Match => scored.sort_by(|a, b| b.match_score.cmp(&a.match_score)),
        SortKey::Latest => scored.sort_by(|a, b| {
            let a = a.posted_date.as_deref().unwrap_or_default();
            let b = b.posted_date.as_deref().unwrap_or_default();
            b.cmp(a)
        }),
        SortKey::Salary => {}
    }
    scored
}

/// 1-based page slice plus `(total, total_pages)`. Pages past the end are empty.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> (Vec<T>, usize, usize) {
    let total = items.len();
    if limit == 0 {
        return (Vec::new(), total, 0);
    }
    let total_pages = total.div_ceil(limit);
    let start = page.saturating_sub(1).saturating_mul(limit);
    let slice = items.into_iter().skip(start).take(limit).collect();
    (slice, total, total_pages)
}
