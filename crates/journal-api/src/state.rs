//! Application state

use journal_auth::{Authenticator, JwtManager};
use journal_db::JournalStore;
use std::sync::Arc;

/// Prometheus handle rendered by `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JournalStore>,
    pub jwt: Arc<JwtManager>,
    pub auth: Arc<Authenticator>,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn JournalStore>,
        jwt: Arc<JwtManager>,
        auth: Arc<Authenticator>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            store,
            jwt,
            auth,
            cookie_secure,
        }
    }
}
