// src/scoring/experience.rs
//! Years-of-experience inference from free-text lines.
//!
//! Date ranges ("Jan 2020 - Mar 2022", "July, 2021 - Present") are summed in
//! months across all lines. Only when no range is found anywhere does the
//! largest explicit "N years" mention (below 40) count.

use chrono::{Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?P<start_month>[a-zA-Z]+)[,.]?\s*(?P<start_year>\d{4})\s*[-–to]+\s*(?P<end_str>.*)")
        .unwrap()
});
static RE_END_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<end_month>[a-zA-Z]+)[,.]?\s*(?P<end_year>\d{4})").unwrap());
static RE_END_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());
static RE_YEARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\+?\s*years?").unwrap());

const MAX_PLAUSIBLE_YEARS: f64 = 40.0;

pub fn years_of_experience<S: AsRef<str>>(lines: &[S]) -> f64 {
    years_of_experience_at(lines, Utc::now().date_naive())
}

/// Open-ended ranges ("Present", "Now", "Current") end at `today`.
pub fn years_of_experience_at<S: AsRef<str>>(lines: &[S], today: NaiveDate) -> f64 {
    let mut range_months: Vec<i64> = Vec::new();
    let mut max_mentioned = 0.0_f64;

    for line in lines {
        let text = line.as_ref();
        for caps in RE_RANGE.captures_iter(text) {
            if let Some(months) = range_span_months(&caps, today) {
                range_months.push(months);
            }
        }
        for caps in RE_YEARS.captures_iter(text) {
            if let Ok(v) = caps[1].parse::<f64>() {
                if v < MAX_PLAUSIBLE_YEARS {
                    max_mentioned = max_mentioned.max(v);
                }
            }
        }
    }

    if range_months.is_empty() {
        return max_mentioned;
    }
    let total: i64 = range_months.iter().sum();
    round1(total as f64 / 12.0)
}

fn range_span_months(caps: &regex::Captures<'_>, today: NaiveDate) -> Option<i64> {
    let start_month = month_number(&caps["start_month"]);
    let start_year: i64 = caps["start_year"].parse().ok()?;
    let end_str = caps["end_str"].trim().to_lowercase();

    let mut end_month = i64::from(today.month());
    let mut end_year = i64::from(today.year());
    let open_ended = ["present", "now", "current"]
        .iter()
        .any(|w| end_str.contains(w));
    if !open_ended {
        if let Some(end) = RE_END_MONTH_YEAR.captures(&end_str) {
            end_month = month_number(&end["end_month"]);
            end_year = end["end_year"].parse().ok()?;
        } else if let Some(end) = RE_END_YEAR.captures(&end_str) {
            end_year = end[1].parse().ok()?;
            end_month = 12;
        }
    }

    let span = (end_year * 12 + end_month) - (start_year * 12 + start_month);
    Some(span.max(0))
}

/// By the first three letters; unknown names count as January.
fn month_number(name: &str) -> i64 {
    let abbr: String = name.to_lowercase().chars().take(3).collect();
    match abbr.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => 1,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// `2.0` renders as `"2.0"`, not `"2"`.
pub fn format_years(years: f64) -> String {
    format!("{years:.1}")
}
