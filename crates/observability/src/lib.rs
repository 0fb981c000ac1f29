use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    fallback_total: AtomicU64,
    empty_results_total: AtomicU64,
    query_failures_total: AtomicU64,
    narrative_generated_total: AtomicU64,
    narrative_fallback_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub fallback_total: u64,
    pub empty_results_total: u64,
    pub query_failures_total: u64,
    pub narrative_generated_total: u64,
    pub narrative_fallback_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallback(&self) {
        self.fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_empty_result(&self) {
        self.empty_results_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_query_failure(&self) {
        self.query_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_narrative_generated(&self) {
        self.narrative_generated_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_narrative_fallback(&self) {
        self.narrative_fallback_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            empty_results_total: self.empty_results_total.load(Ordering::Relaxed),
            query_failures_total: self.query_failures_total.load(Ordering::Relaxed),
            narrative_generated_total: self.narrative_generated_total.load(Ordering::Relaxed),
            narrative_fallback_total: self.narrative_fallback_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,cresta_api=info,cresta_agents=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
