// src/scoring/mod.rs
//! Posting-vs-profile match scoring.
//!
//! Weighted sum of skill overlap (0.5), role similarity (0.3) and experience
//! fit (0.2), plus a 0.15 bonus for a literal city match, scaled to 0..=100.
//! A posting outside the candidate's location (and not remote) scores 0 and
//! skips everything else.

pub mod experience;
pub mod similarity;
pub mod vocab;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::types::{Posting, SourceTag};
use crate::profile::CandidateProfile;

use self::experience::{format_years, years_of_experience_at};
use self::similarity::partial_ratio;
use self::vocab::{implied_terms, mentions};

const SKILL_WEIGHT: f64 = 0.5;
const ROLE_WEIGHT: f64 = 0.3;
const EXPERIENCE_WEIGHT: f64 = 0.2;
const CITY_BONUS: f64 = 0.15;
/// Used when no skill can be inferred from the posting at all.
const NEUTRAL_SKILL_SCORE: f64 = 0.5;
const DEFAULT_REQUIRED_YEARS: f64 = 1.0;
const MAX_MISSING_SKILLS: usize = 5;
const PREVIEW_CHARS: usize = 200;

pub const LOCATION_MISMATCH_REASON: &str = "Location does not match profile";
pub const FALLBACK_REASON: &str = "Partial match based on profile";

/// Display subset of a posting plus its match explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPosting {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub match_score: u8,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub experience_difference: String,
    pub reason: String,
    pub apply_link: String,
    pub source: SourceTag,
    /// `%Y-%m-%dT%H:%M:%S`, so string order is time order.
    pub posted_date: Option<String>,
    /// First 200 characters followed by `...`.
    pub description: String,
    pub job_type: String,
}

impl ScoredPosting {
    fn display(p: &Posting) -> Self {
        Self {
            job_id: p.job_id.clone(),
            title: p.title.clone(),
            company: p.company.clone(),
            location: p.location.clone(),
            match_score: 0,
            matching_skills: Vec::new(),
            missing_skills: Vec::new(),
            experience_difference: String::new(),
            reason: String::new(),
            apply_link: p.apply_link.clone(),
            source: p.source,
            posted_date: p
                .published_at
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            description: preview(&p.description),
            job_type: p.job_type.clone(),
        }
    }
}

fn preview(description: &str) -> String {
    let mut s: String = description.chars().take(PREVIEW_CHARS).collect();
    s.push_str("...");
    s
}

pub fn score(posting: &Posting, profile: &CandidateProfile) -> ScoredPosting {
    score_at(posting, profile, Utc::now().date_naive())
}

/// `today` closes open-ended experience ranges.
pub fn score_at(posting: &Posting, profile: &CandidateProfile, today: NaiveDate) -> ScoredPosting {
    let mut out = ScoredPosting::display(posting);

    let job_location = posting.location.trim().to_lowercase();
    let user_location = profile.normalized_location();
    let is_remote = job_location.contains("remote");
    let location_ok = match user_location.as_deref() {
        None => true,
        Some(u) => job_location.contains(u) || u.contains(job_location.as_str()) || is_remote,
    };
    if !location_ok {
        out.experience_difference = "Location mismatch".to_string();
        out.reason = LOCATION_MISMATCH_REASON.to_string();
        return out;
    }

    // skills
    let text = format!("{} {}", posting.title, posting.description).to_lowercase();
    let profile_skills: Vec<String> = profile
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut implied: Vec<String> = implied_terms(&text).into_iter().map(str::to_string).collect();
    for skill in &profile_skills {
        if mentions(&text, skill) && !implied.contains(skill) {
            implied.push(skill.clone());
        }
    }

    let skill_score = if implied.is_empty() {
        NEUTRAL_SKILL_SCORE
    } else {
        let (matching, missing): (Vec<String>, Vec<String>) = implied
            .iter()
            .cloned()
            .partition(|s| profile_skills.contains(s));
        let ratio = matching.len() as f64 / implied.len() as f64;
        out.matching_skills = matching;
        out.missing_skills = missing.into_iter().take(MAX_MISSING_SKILLS).collect();
        ratio
    };

    // role
    let role_similarity = f64::from(partial_ratio(profile.current_role(), &posting.title)) / 100.0;

    // experience
    let user_years = years_of_experience_at(profile.experience.as_slice(), today);
    let mut required = years_of_experience_at(&[posting.description.as_str()], today);
    if required == 0.0 {
        required = DEFAULT_REQUIRED_YEARS;
    }
    let experience_met = user_years >= required;
    let experience_score = if experience_met { 1.0 } else { user_years / required };
    out.experience_difference = if experience_met {
        format!(
            "You have {} years (Job needs {}+)",
            format_years(user_years),
            format_years(required)
        )
    } else {
        format!(
            "Gap: You have {} years (Job needs {}+)",
            format_years(user_years),
            format_years(required)
        )
    };

    let city_bonus = match user_location.as_deref() {
        Some(u) if job_location.contains(u) => CITY_BONUS,
        _ => 0.0,
    };

    let total = skill_score * SKILL_WEIGHT
        + role_similarity * ROLE_WEIGHT
        + experience_score * EXPERIENCE_WEIGHT
        + city_bonus;
    out.match_score = (total.min(1.0) * 100.0).round().clamp(0.0, 100.0) as u8;

    let mut reasons: Vec<&str> = Vec::new();
    if is_remote {
        reasons.push("Remote job");
    } else if city_bonus > 0.0 {
        reasons.push("Location match");
    }
    if skill_score > 0.7 {
        reasons.push("Strong skill match");
    } else if skill_score > 0.4 {
        reasons.push("Good skill overlap");
    }
    if role_similarity > 0.8 {
        reasons.push("Role aligns perfectly");
    } else if role_similarity > 0.5 {
        reasons.push("Similar role");
    }
    if experience_met {
        reasons.push("Experience requirement met");
    }
    out.reason = if reasons.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        reasons.join(", ")
    };

    out
}
