//! Job aggregator: binary entrypoint.
//! Boots the Axum HTTP server with the aggregation service, caches and `/metrics`.

use std::sync::Arc;

use job_aggregator::{
    api, metrics::Metrics, AppConfig, InMemoryProfiles, JobService, ProfileStore,
};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs; a subscriber installed by the runtime takes precedence.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("job_aggregator=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

fn load_profiles(cfg: &AppConfig) -> anyhow::Result<Arc<dyn ProfileStore>> {
    let store = match cfg.profiles_path.as_deref() {
        Some(path) => InMemoryProfiles::from_json_file(path)?,
        None => InMemoryProfiles::new(),
    };
    tracing::info!(count = store.len(), "profile store ready");
    Ok(Arc::new(store))
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load()?;
    if cfg.rapidapi_key.is_empty() {
        tracing::warn!("RAPIDAPI_KEY not set; structured-API source will return nothing");
    }

    let service = JobService::from_config(&cfg, load_profiles(&cfg)?)?;
    let mut router = api::create_router(api::AppState::new(service));

    match Metrics::init(&cfg) {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    tracing::info!(
        hybrid_ttl_h = cfg.hybrid_cache_ttl_hours,
        keyword_ttl_h = cfg.keyword_cache_ttl_hours,
        cache_dir = ?cfg.cache_dir,
        "job aggregator ready"
    );
    Ok(router.into())
}
