// src/analysis.rs
//! Skill-gap report: what the current job market asks for that a profile lacks.

use std::collections::HashMap;

use serde::Serialize;

use crate::ingest::types::Posting;
use crate::scoring::vocab::{extract_skills_from_text, normalize_skill_list};

/// A skill must show up in at least this many postings to count as market demand.
const MIN_POSTINGS_PER_SKILL: usize = 2;
const TOP_MARKET_SKILLS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingSkill {
    pub skill: String,
    /// 0..=100 relative to the most demanded skill.
    pub priority: u32,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillFrequency {
    pub skill: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillStrength {
    pub skill: String,
    pub coverage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGapReport {
    pub user_skills: Vec<String>,
    pub market_skills: Vec<String>,
    pub missing_skills: Vec<MissingSkill>,
    pub top_market_skills: Vec<SkillFrequency>,
    pub skill_strengths: Vec<SkillStrength>,
    pub total_jobs_analyzed: usize,
}

pub fn skill_gap<S: AsRef<str>>(profile_skills: &[S], postings: &[Posting]) -> SkillGapReport {
    let user_skills = normalize_skill_list(profile_skills);

    // frequency per canonical skill, in first-seen order
    let mut order: Vec<&'static str> = Vec::new();
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for p in postings {
        let text = format!("{} {}", p.title, p.description);
        for skill in extract_skills_from_text(&text) {
            let n = counts.entry(skill).or_insert(0);
            if *n == 0 {
                order.push(skill);
            }
            *n += 1;
        }
    }

    let market: Vec<SkillFrequency> = order
        .iter()
        .filter_map(|s| {
            let f = counts.get(s).copied().unwrap_or(0);
            (f >= MIN_POSTINGS_PER_SKILL).then(|| SkillFrequency {
                skill: s.to_string(),
                frequency: f,
            })
        })
        .collect();
    let max_frequency = market.iter().map(|m| m.frequency).max().unwrap_or(1);
    let relative = |f: usize| ((f as f64 / max_frequency as f64) * 100.0) as u32;

    let mut missing_skills: Vec<MissingSkill> = market
        .iter()
        .filter(|m| !user_skills.contains(&m.skill))
        .map(|m| MissingSkill {
            skill: m.skill.clone(),
            priority: relative(m.frequency),
            frequency: m.frequency,
        })
        .collect();
    missing_skills.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut top_market_skills = market.clone();
    top_market_skills.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    top_market_skills.truncate(TOP_MARKET_SKILLS);

    let mut skill_strengths: Vec<SkillStrength> = user_skills
        .iter()
        .map(|s| {
            let f = market
                .iter()
                .find(|m| &m.skill == s)
                .map(|m| m.frequency)
                .unwrap_or(0);
            SkillStrength {
                skill: s.clone(),
                coverage: relative(f),
            }
        })
        .collect();
    skill_strengths.sort_by(|a, b| b.coverage.cmp(&a.coverage));

    SkillGapReport {
        user_skills,
        market_skills: market.into_iter().map(|m| m.skill).collect(),
        missing_skills,
        top_market_skills,
        skill_strengths,
        total_jobs_analyzed: postings.len(),
    }
}
