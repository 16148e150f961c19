// src/config.rs
//! Service configuration: `config/jobs.toml` (or `$JOBS_CONFIG_PATH`) with env overrides.
//!
//! ```toml
//! hybrid_cache_ttl_hours = 6
//! keyword_cache_ttl_hours = 24
//! feed_timeout_secs = 15
//! cache_dir = "cache/jobs"
//! ```
//!
//! Secrets (`RAPIDAPI_KEY`, `RAPIDAPI_HOST`) normally come from the environment / `.env`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::ingest::providers::{hn, jsearch, remoteok, wwr};

pub const DEFAULT_CONFIG_PATH: &str = "config/jobs.toml";
pub const ENV_CONFIG_PATH: &str = "JOBS_CONFIG_PATH";

pub const DEFAULT_HYBRID_TTL_HOURS: i64 = 6;
pub const DEFAULT_KEYWORD_TTL_HOURS: i64 = 24;
pub const DEFAULT_FALLBACK_QUERY: &str = "Software Engineer";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rapidapi_key: String,
    pub rapidapi_host: String,
    pub jsearch_url: String,
    pub remoteok_url: String,
    pub wwr_url: String,
    pub hn_url: String,
    pub api_timeout_secs: u64,
    pub feed_timeout_secs: u64,
    pub user_agent: String,
    pub hybrid_cache_ttl_hours: i64,
    pub keyword_cache_ttl_hours: i64,
    /// File-backed caches when set; in-memory otherwise.
    pub cache_dir: Option<PathBuf>,
    /// JSON object of identity -> profile used to seed the in-memory profile store.
    pub profiles_path: Option<PathBuf>,
    pub fallback_query: String,
    /// Profile searches returning fewer postings than this trigger the fallback query.
    pub fallback_threshold: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rapidapi_key: String::new(),
            rapidapi_host: "jsearch.p.rapidapi.com".to_string(),
            jsearch_url: jsearch::DEFAULT_URL.to_string(),
            remoteok_url: remoteok::DEFAULT_URL.to_string(),
            wwr_url: wwr::DEFAULT_URL.to_string(),
            hn_url: hn::DEFAULT_URL.to_string(),
            api_timeout_secs: 10,
            feed_timeout_secs: 15,
            user_agent: "job-aggregator/0.1".to_string(),
            hybrid_cache_ttl_hours: DEFAULT_HYBRID_TTL_HOURS,
            keyword_cache_ttl_hours: DEFAULT_KEYWORD_TTL_HOURS,
            cache_dir: None,
            profiles_path: None,
            fallback_query: DEFAULT_FALLBACK_QUERY.to_string(),
            fallback_threshold: 5,
        }
    }
}

impl AppConfig {
    /// Resolve the config file, parse it and apply env overrides.
    ///
    /// 1) `$JOBS_CONFIG_PATH` (must exist)
    /// 2) `config/jobs.toml` (optional; defaults when absent)
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let path = PathBuf::from(p);
                if !path.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::from_file(&path)?
            }
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading jobs config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing jobs config toml")?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RAPIDAPI_KEY") {
            self.rapidapi_key = v.trim().to_string();
        }
        if let Ok(v) = std::env::var("RAPIDAPI_HOST") {
            if !v.trim().is_empty() {
                self.rapidapi_host = v.trim().to_string();
            }
        }
        if let Some(h) = parse_hours_env(std::env::var("HYBRID_CACHE_TTL_HOURS").ok()) {
            self.hybrid_cache_ttl_hours = h;
        }
        if let Some(h) = parse_hours_env(std::env::var("KEYWORD_CACHE_TTL_HOURS").ok()) {
            self.keyword_cache_ttl_hours = h;
        }
        if let Ok(v) = std::env::var("JOBS_CACHE_DIR") {
            if !v.trim().is_empty() {
                self.cache_dir = Some(PathBuf::from(v.trim()));
            }
        }
        if let Ok(v) = std::env::var("JOBS_PROFILES_PATH") {
            if !v.trim().is_empty() {
                self.profiles_path = Some(PathBuf::from(v.trim()));
            }
        }
    }

    fn sanitize(&mut self) {
        if self.hybrid_cache_ttl_hours <= 0 {
            self.hybrid_cache_ttl_hours = DEFAULT_HYBRID_TTL_HOURS;
        }
        if self.keyword_cache_ttl_hours <= 0 {
            self.keyword_cache_ttl_hours = DEFAULT_KEYWORD_TTL_HOURS;
        }
        if self.fallback_query.trim().is_empty() {
            self.fallback_query = DEFAULT_FALLBACK_QUERY.to_string();
        }
        if self.api_timeout_secs == 0 {
            self.api_timeout_secs = 10;
        }
        if self.feed_timeout_secs == 0 {
            self.feed_timeout_secs = 15;
        }
    }

    pub fn hybrid_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.hybrid_cache_ttl_hours)
    }

    pub fn keyword_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.keyword_cache_ttl_hours)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    /// Shared outbound client; per-request budgets are enforced by each adapter.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .connect_timeout(Duration::from_secs(4))
            .timeout(self.feed_timeout().max(self.api_timeout()))
            .build()
            .context("building http client")
    }
}

fn parse_hours_env(raw: Option<String>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|h| *h > 0)
}
