// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot, with
// in-process mock sources and an in-memory profile store.
//
// Covered:
// - GET /health
// - GET /jobs/search      (pagination, provenance, validation)
// - GET /jobs/keyword     (structured API only)
// - GET /jobs/recommended (identity header, unknown user, sort validation)
// - GET /skills/analysis

mod common;

use std::sync::Arc;

use chrono::Duration;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use common::{posting, MockProvider};
use job_aggregator::aggregate::Aggregator;
use job_aggregator::api::{create_router, AppState, IDENTITY_HEADER};
use job_aggregator::cache::{NamedStore, HYBRID_STORE, KEYWORD_STORE};
use job_aggregator::ingest::types::{SourceProvider, SourceTag};
use job_aggregator::keyword::KeywordSearch;
use job_aggregator::profile::{CandidateProfile, InMemoryProfiles};
use job_aggregator::recommend::JobService;

const BODY_LIMIT: usize = 1024 * 1024;

/// Same Router the binary builds, over mock sources.
fn test_router() -> Router {
    let api = Arc::new(MockProvider::for_keyword(
        SourceTag::Api,
        "rust",
        vec![
            posting("a-1", SourceTag::Api, "Rust Engineer", "Acme"),
            posting("a-2", SourceTag::Api, "Rust Developer", "Globex"),
            posting("a-3", SourceTag::Api, "Rust Platform Engineer", "Hooli"),
        ],
    ));
    let hn = Arc::new(MockProvider::new(
        SourceTag::Hn,
        vec![
            posting("hn-1", SourceTag::Hn, "Rust Compiler Engineer", "Rustacean Labs"),
            posting("hn-2", SourceTag::Hn, "Software Engineer", "Initech"),
        ],
    ));

    let providers: Vec<Arc<dyn SourceProvider>> = vec![api.clone(), hn];
    let aggregator = Aggregator::new(providers, NamedStore::in_memory(HYBRID_STORE), Duration::hours(6));
    let keyword = KeywordSearch::new(api, NamedStore::in_memory(KEYWORD_STORE), Duration::hours(24));

    let profiles = InMemoryProfiles::new();
    profiles
        .insert(
            "u-1",
            CandidateProfile {
                skills: vec!["Rust".into(), "Kubernetes".into()],
                experience: vec![],
                location: None,
            },
        )
        .expect("insert profile");

    create_router(AppState::new(JobService::new(aggregator, keyword, Arc::new(profiles))))
}

async fn get(app: Router, uri: &str, user: Option<&str>) -> (StatusCode, Json) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(u) = user {
        builder = builder.header(IDENTITY_HEADER, u);
    }
    let req = builder.body(Body::empty()).expect("build request");

    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = test_router().oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).expect("utf8"), "ok");
}

#[tokio::test]
async fn search_returns_page_with_provenance() {
    let (status, v) = get(test_router(), "/jobs/search?query=rust&page=2&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(v["total"], 5);
    assert_eq!(v["total_pages"], 3);
    assert_eq!(v["page"], 2);
    assert_eq!(v["from_cache"], false);
    assert_eq!(v["postings"].as_array().map(Vec::len), Some(2));
    assert_eq!(v["sources_used"], serde_json::json!(["api", "hn"]));
}

#[tokio::test]
async fn search_accepts_role_alias_and_serves_repeat_from_cache() {
    let app = test_router();
    let (_, first) = get(app.clone(), "/jobs/search?role=Rust", None).await;
    let (status, second) = get(app, "/jobs/search?query=rust", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["from_cache"], false);
    assert_eq!(second["from_cache"], true, "query key is case-insensitive");
    assert_eq!(first["postings"], second["postings"]);
}

#[tokio::test]
async fn search_rejects_bad_input_with_validation_error() {
    for uri in [
        "/jobs/search?query=rust&limit=51",
        "/jobs/search?query=rust&page=0",
        "/jobs/search?query=%20%20",
        "/jobs/search",
    ] {
        let (status, v) = get(test_router(), uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(v["error"], "VALIDATION_ERROR", "{uri}");
        assert!(v["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}

#[tokio::test]
async fn keyword_uses_the_structured_api_only() {
    let (status, v) = get(test_router(), "/jobs/keyword?query=rust&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["total"], 3);
    assert_eq!(v["total_pages"], 2);
    assert_eq!(v["limit"], 2);
    let jobs = v["jobs"].as_array().expect("jobs array");
    assert!(jobs.iter().all(|j| j["source"] == "api"));
}

#[tokio::test]
async fn recommended_requires_identity_header() {
    let (status, v) = get(test_router(), "/jobs/recommended", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn recommended_unknown_user_is_404() {
    let (status, v) = get(test_router(), "/jobs/recommended", Some("ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"], "NOT_FOUND");
}

#[tokio::test]
async fn recommended_rejects_unknown_sort() {
    let (status, v) = get(test_router(), "/jobs/recommended?sort=random", Some("u-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn recommended_returns_scored_postings_for_known_user() {
    let (status, v) = get(test_router(), "/jobs/recommended?limit=10", Some("u-1")).await;
    assert_eq!(status, StatusCode::OK, "{v}");

    assert_eq!(v["query"], "Rust");
    assert_eq!(v["sort"], "match");
    // 5 postings for "Rust" is enough; no fallback
    assert_eq!(v["fallback_used"], false);

    let postings = v["postings"].as_array().expect("postings array");
    // "Software Engineer" at Initech never mentions a profile skill
    assert_eq!(postings.len(), 4);
    assert!(postings.iter().all(|p| p["job_id"] != "hn-2"));

    let scores: Vec<u64> = postings
        .iter()
        .map(|p| p["match_score"].as_u64().expect("score"))
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
    assert!(scores.iter().all(|s| (1..=100).contains(s)));
    assert!(postings[0]["description"].as_str().is_some_and(|d| d.ends_with("...")));
}

#[tokio::test]
async fn skill_analysis_reports_market_skills() {
    let (status, v) = get(test_router(), "/skills/analysis", Some("u-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["total_jobs_analyzed"], 5);
    assert_eq!(v["user_skills"], serde_json::json!(["rust", "kubernetes"]));
    assert_eq!(v["market_skills"], serde_json::json!(["rust"]));
    assert_eq!(v["skill_strengths"][0]["skill"], "rust");
    assert_eq!(v["skill_strengths"][0]["coverage"], 100);

    let (status, _) = get(test_router(), "/skills/analysis", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
