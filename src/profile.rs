// src/profile.rs
//! Candidate profile as consumed by scoring, and the lookup boundary used to
//! resolve it from a caller identity. Profile storage itself lives elsewhere.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scoring::experience::{years_of_experience, years_of_experience_at};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    /// Free-text entries; the first line of the first entry is the current role.
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl CandidateProfile {
    pub fn current_role(&self) -> &str {
        self.experience
            .first()
            .and_then(|e| e.split('\n').next())
            .unwrap_or_default()
    }

    pub fn years(&self) -> f64 {
        years_of_experience(self.experience.as_slice())
    }

    pub fn years_at(&self, today: NaiveDate) -> f64 {
        years_of_experience_at(self.experience.as_slice(), today)
    }

    /// Lowercased and trimmed; `None` when unset or blank.
    pub fn normalized_location(&self) -> Option<String> {
        self.location
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
    }
}

/// Resolves the profile owned by an opaque caller identity.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile_for(&self, identity: &str) -> Result<Option<CandidateProfile>>;
}

#[derive(Debug, Default)]
pub struct InMemoryProfiles {
    profiles: RwLock<HashMap<String, CandidateProfile>>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a JSON object keyed by identity.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let map: HashMap<String, CandidateProfile> =
            serde_json::from_str(s).context("parsing profiles json")?;
        Ok(Self {
            profiles: RwLock::new(map),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading profiles from {}", path.display()))?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.profiles.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, identity: impl Into<String>, profile: CandidateProfile) -> Result<()> {
        let mut map = self
            .profiles
            .write()
            .map_err(|_| anyhow!("profile lock poisoned"))?;
        map.insert(identity.into(), profile);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfiles {
    async fn profile_for(&self, identity: &str) -> Result<Option<CandidateProfile>> {
        let map = self
            .profiles
            .read()
            .map_err(|_| anyhow!("profile lock poisoned"))?;
        Ok(map.get(identity).cloned())
    }
}
