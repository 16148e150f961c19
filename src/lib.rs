// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod keyword;
pub mod metrics;
pub mod profile;
pub mod rank;
pub mod recommend;
pub mod scoring;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{AggregateResult, Aggregator};
pub use crate::api::{create_router, AppState};
pub use crate::config::AppConfig;
pub use crate::error::AppError;
pub use crate::ingest::{Posting, SearchQuery, SourceProvider, SourceTag};
pub use crate::profile::{CandidateProfile, InMemoryProfiles, ProfileStore};
pub use crate::rank::{rank, SortKey};
pub use crate::recommend::JobService;
pub use crate::scoring::{score, ScoredPosting};
