// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::cache::{HYBRID_STORE, KEYWORD_STORE};
use crate::config::AppConfig;
use crate::ingest::ensure_metrics_described;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured cache TTLs as static gauges.
    /// Fails if a global recorder is already installed.
    pub fn init(cfg: &AppConfig) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        ensure_metrics_described();
        gauge!("cache_ttl_hours", "store" => HYBRID_STORE).set(cfg.hybrid_cache_ttl_hours as f64);
        gauge!("cache_ttl_hours", "store" => KEYWORD_STORE).set(cfg.keyword_cache_ttl_hours as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
