pub mod api;
pub mod card;
pub mod config;
pub mod errors;
pub mod escrow;
pub mod format;
pub mod join;
pub mod listing;
pub mod metrics;
pub mod models;
pub mod platform;
pub mod query;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::join::JoinSessions;
use crate::platform::PlatformClient;
use crate::query::{Queries, QueryClient};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub platform: PlatformClient,
    pub query_client: QueryClient,
    pub queries: Arc<Queries>,
    pub sessions: JoinSessions,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        platform: PlatformClient,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        Self {
            queries: Arc::new(Queries::new(&config)),
            sessions: JoinSessions::new(config.join_cooldown(), config.join_session_ttl()),
            query_client: QueryClient::new(),
            config,
            platform,
            metrics_handle,
        }
    }
}
