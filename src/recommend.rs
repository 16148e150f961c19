// src/recommend.rs
//! Caller-facing operations: plain search, profile-driven recommendations and
//! skill-gap analysis, all on top of the aggregate cache.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{NaiveDateTime, Utc};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::aggregate::{AggregateResult, Aggregator};
use crate::analysis::{skill_gap, SkillGapReport};
use crate::cache::{KeywordCacheEntry, NamedStore, KEYWORD_STORE};
use crate::config::{AppConfig, DEFAULT_FALLBACK_QUERY};
use crate::error::AppError;
use crate::ingest::types::{Posting, SearchQuery, SourceTag};
use crate::keyword::{KeywordPage, KeywordSearch};
use crate::profile::{CandidateProfile, ProfileStore};
use crate::rank::{paginate, rank, SortKey};
use crate::scoring::score_at;

static RE_SENIOR_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Senior|Sr\.|Lead|Principal|Manager|Architect|Head|Director|VP)\b").unwrap()
});
static RE_JUNIOR_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Intern|Internship|Junior|Jr\.|Entry Level|Trainee)\b").unwrap()
});

/// Below this many years, senior-sounding titles are skipped.
const JUNIOR_MAX_YEARS: f64 = 1.5;
/// Above this many years, junior-sounding titles are skipped.
const SENIOR_MIN_YEARS: f64 = 3.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchPage {
    pub postings: Vec<Posting>,
    pub sources_used: Vec<SourceTag>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub from_cache: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendPage {
    pub postings: Vec<crate::scoring::ScoredPosting>,
    pub sources_used: Vec<SourceTag>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub sort: SortKey,
    /// The query actually derived from the profile.
    pub query: String,
    pub fallback_used: bool,
}

/// Postings gathered for a profile, after the optional fallback merge.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResults {
    pub query: String,
    pub postings: Vec<Posting>,
    pub sources_used: Vec<SourceTag>,
    pub fallback_used: bool,
}

#[derive(Clone)]
pub struct JobService {
    aggregator: Aggregator,
    keyword: KeywordSearch,
    profiles: Arc<dyn ProfileStore>,
    fallback_query: String,
    fallback_threshold: usize,
}

impl JobService {
    pub fn new(aggregator: Aggregator, keyword: KeywordSearch, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            aggregator,
            keyword,
            profiles,
            fallback_query: DEFAULT_FALLBACK_QUERY.to_string(),
            fallback_threshold: 5,
        }
    }

    pub fn with_fallback(mut self, query: impl Into<String>, threshold: usize) -> Self {
        self.fallback_query = query.into();
        self.fallback_threshold = threshold;
        self
    }

    /// Live sources, caches and fallback settings from `cfg`.
    pub fn from_config(cfg: &AppConfig, profiles: Arc<dyn ProfileStore>) -> Result<Self> {
        let providers = Aggregator::live_providers(cfg)?;
        let api = providers
            .iter()
            .find(|p| p.tag() == SourceTag::Api)
            .cloned()
            .ok_or_else(|| anyhow!("no structured-API provider configured"))?;

        let keyword_store: NamedStore<KeywordCacheEntry> = match cfg.cache_dir.as_deref() {
            Some(dir) => NamedStore::on_disk(KEYWORD_STORE, dir)?,
            None => NamedStore::in_memory(KEYWORD_STORE),
        };
        let aggregator = Aggregator::new(providers, Aggregator::store_for(cfg)?, cfg.hybrid_ttl());
        let keyword = KeywordSearch::new(api, keyword_store, cfg.keyword_ttl());

        Ok(Self::new(aggregator, keyword, profiles)
            .with_fallback(cfg.fallback_query.clone(), cfg.fallback_threshold))
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Unranked, newest first.
    pub async fn search(&self, query: &SearchQuery, page: usize, limit: usize) -> SearchPage {
        self.search_at(query, page, limit, Utc::now().naive_utc()).await
    }

    pub async fn search_at(
        &self,
        query: &SearchQuery,
        page: usize,
        limit: usize,
        now: NaiveDateTime,
    ) -> SearchPage {
        let AggregateResult {
            postings,
            sources_used,
            from_cache,
        } = self.aggregator.get_or_fetch_at(query, now).await;
        let (postings, total, total_pages) = paginate(postings, page, limit);
        SearchPage {
            postings,
            sources_used,
            total,
            page,
            limit,
            total_pages,
            from_cache,
        }
    }

    pub async fn keyword_search(&self, query: &SearchQuery, page: usize, limit: usize) -> KeywordPage {
        self.keyword.search(query, page, limit).await
    }

    /// Top skill as the query (or the fallback query), profile location, remote only.
    /// A thin result triggers the fallback query, merged in by `job_id`.
    pub async fn profile_postings_at(&self, profile: &CandidateProfile, now: NaiveDateTime) -> ProfileResults {
        let text = profile
            .skills
            .first()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(self.fallback_query.as_str())
            .to_string();
        let location = profile.location.as_deref();
        let primary = self
            .aggregator
            .get_or_fetch_at(&SearchQuery::new(text.as_str(), location, true), now)
            .await;

        let mut postings = primary.postings;
        let mut sources_used = primary.sources_used;
        let mut fallback_used = false;

        if postings.len() < self.fallback_threshold && !text.eq_ignore_ascii_case(&self.fallback_query) {
            tracing::info!(
                query = %text,
                count = postings.len(),
                fallback = %self.fallback_query,
                "thin profile result; running fallback query"
            );
            counter!("fallback_queries_total").increment(1);
            fallback_used = true;

            let extra = self
                .aggregator
                .get_or_fetch_at(&SearchQuery::new(self.fallback_query.as_str(), location, true), now)
                .await;
            let mut seen: HashSet<String> = postings.iter().map(|p| p.job_id.clone()).collect();
            for p in extra.postings {
                if seen.insert(p.job_id.clone()) {
                    postings.push(p);
                }
            }
            for tag in extra.sources_used {
                if !sources_used.contains(&tag) {
                    sources_used.push(tag);
                }
            }
        }

        ProfileResults {
            query: text,
            postings,
            sources_used,
            fallback_used,
        }
    }

    /// Filtered, scored (zero scores dropped), ranked and paginated.
    pub async fn recommend(
        &self,
        profile: &CandidateProfile,
        page: usize,
        limit: usize,
        sort: SortKey,
    ) -> RecommendPage {
        self.recommend_at(profile, page, limit, sort, Utc::now().naive_utc())
            .await
    }

    pub async fn recommend_at(
        &self,
        profile: &CandidateProfile,
        page: usize,
        limit: usize,
        sort: SortKey,
        now: NaiveDateTime,
    ) -> RecommendPage {
        let results = self.profile_postings_at(profile, now).await;
        let today = now.date();
        let years = profile.years_at(today);

        let scored: Vec<_> = results
            .postings
            .iter()
            .filter(|p| passes_strict_filters(p, profile, years))
            .map(|p| score_at(p, profile, today))
            .filter(|s| s.match_score > 0)
            .collect();
        let ranked = rank(scored, sort);
        let (postings, total, total_pages) = paginate(ranked, page, limit);

        RecommendPage {
            postings,
            sources_used: results.sources_used,
            total,
            page,
            limit,
            total_pages,
            sort,
            query: results.query,
            fallback_used: results.fallback_used,
        }
    }

    async fn load_profile(&self, identity: &str) -> Result<CandidateProfile, AppError> {
        self.profiles
            .profile_for(identity)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no profile found for `{identity}`")))
    }

    pub async fn recommend_for(
        &self,
        identity: &str,
        page: usize,
        limit: usize,
        sort: SortKey,
    ) -> Result<RecommendPage, AppError> {
        let profile = self.load_profile(identity).await?;
        Ok(self.recommend(&profile, page, limit, sort).await)
    }

    pub async fn skill_gap_for(&self, identity: &str) -> Result<SkillGapReport, AppError> {
        self.skill_gap_for_at(identity, Utc::now().naive_utc()).await
    }

    pub async fn skill_gap_for_at(&self, identity: &str, now: NaiveDateTime) -> Result<SkillGapReport, AppError> {
        let profile = self.load_profile(identity).await?;
        // market demand comes from the profile-driven result set, not from every
        // cached keyword page; the keyword store is a key/value cache with no scan
        let results = self.profile_postings_at(&profile, now).await;
        Ok(skill_gap(profile.skills.as_slice(), &results.postings))
    }
}

/// Seniority band by title, then at least one profile skill somewhere in the posting.
pub fn passes_strict_filters(posting: &Posting, profile: &CandidateProfile, years: f64) -> bool {
    if years < JUNIOR_MAX_YEARS {
        if RE_SENIOR_TITLE.is_match(&posting.title) {
            return false;
        }
    } else if years > SENIOR_MIN_YEARS && RE_JUNIOR_TITLE.is_match(&posting.title) {
        return false;
    }

    let skills: Vec<String> = profile
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if skills.is_empty() {
        return true;
    }
    let text = format!("{} {}", posting.title, posting.description).to_lowercase();
    skills.iter().any(|s| mentions_word(&text, s))
}

/// Plain whole-word search; unlike the vocabulary matcher there are no exclusions.
fn mentions_word(text_lower: &str, term: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(term)))
        .map(|re| re.is_match(text_lower))
        .unwrap_or(false)
}
