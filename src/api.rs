// src/api.rs
use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analysis::SkillGapReport;
use crate::error::AppError;
use crate::ingest::types::SearchQuery;
use crate::keyword::KeywordPage;
use crate::rank::SortKey;
use crate::recommend::{JobService, RecommendPage, SearchPage};

pub const IDENTITY_HEADER: &str = "x-user-id";
pub const MAX_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<JobService>,
}

impl AppState {
    pub fn new(service: JobService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/jobs/search", get(search_jobs))
        .route("/jobs/keyword", get(keyword_jobs))
        .route("/jobs/recommended", get(recommended_jobs))
        .route("/skills/analysis", get(skill_analysis))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, serde::Deserialize)]
struct SearchParams {
    #[serde(default, alias = "role")]
    query: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    remote: bool,
    page: Option<usize>,
    limit: Option<usize>,
}

impl SearchParams {
    fn to_query(&self) -> Result<SearchQuery, AppError> {
        let text = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::Validation("`query` must not be empty".to_string()))?;
        Ok(SearchQuery::new(text, self.location.as_deref(), self.remote))
    }
}

#[derive(Debug, serde::Deserialize)]
struct RecommendParams {
    page: Option<usize>,
    limit: Option<usize>,
    #[serde(default)]
    sort: Option<String>,
}

fn page_bounds(page: Option<usize>, limit: Option<usize>, default_limit: usize) -> Result<(usize, usize), AppError> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(default_limit);
    if page < 1 {
        return Err(AppError::Validation("`page` must be >= 1".to_string()));
    }
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!("`limit` must be between 1 and {MAX_LIMIT}")));
    }
    Ok((page, limit))
}

fn identity(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("missing `{IDENTITY_HEADER}` header")))
}

async fn search_jobs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>, AppError> {
    let (page, limit) = page_bounds(params.page, params.limit, 20)?;
    let query = params.to_query()?;
    Ok(Json(state.service.search(&query, page, limit).await))
}

async fn keyword_jobs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<KeywordPage>, AppError> {
    let (page, limit) = page_bounds(params.page, params.limit, 10)?;
    let query = params.to_query()?;
    Ok(Json(state.service.keyword_search(&query, page, limit).await))
}

async fn recommended_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RecommendParams>,
) -> Result<Json<RecommendPage>, AppError> {
    let (page, limit) = page_bounds(params.page, params.limit, 10)?;
    let sort = match params.sort.as_deref() {
        None => SortKey::default(),
        Some(s) => s
            .parse::<SortKey>()
            .map_err(|e| AppError::Validation(e.to_string()))?,
    };
    let who = identity(&headers)?;
    let out = state.service.recommend_for(&who, page, limit, sort).await?;
    Ok(Json(out))
}

async fn skill_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SkillGapReport>, AppError> {
    let who = identity(&headers)?;
    Ok(Json(state.service.skill_gap_for(&who).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_enforced() {
        assert_eq!(page_bounds(None, None, 20).unwrap(), (1, 20));
        assert!(page_bounds(Some(0), None, 20).is_err());
        assert!(page_bounds(Some(1), Some(0), 20).is_err());
        assert!(page_bounds(Some(1), Some(51), 20).is_err());
        assert_eq!(page_bounds(Some(2), Some(50), 20).unwrap(), (2, 50));
    }

    #[test]
    fn blank_query_is_rejected() {
        let p = SearchParams {
            query: Some("  ".into()),
            location: None,
            remote: false,
            page: None,
            limit: None,
        };
        assert!(matches!(p.to_query(), Err(AppError::Validation(_))));
    }
}
