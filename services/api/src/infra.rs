use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use job_board::config::AppConfig;
use job_board::{InMemoryStore, JobBoard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Board over a fresh in-memory store, signing tokens with the configured secret.
pub(crate) fn build_board(config: &AppConfig) -> Arc<JobBoard<InMemoryStore>> {
    Arc::new(JobBoard::new(
        Arc::new(InMemoryStore::new()),
        config.auth.authority(),
        config.board.clone(),
    ))
}
