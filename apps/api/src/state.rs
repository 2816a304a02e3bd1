use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::interview::registry::SessionStore;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Injectable session store. Default: in-memory map. A durable keyed
    /// store can be swapped in here without touching lifecycle logic.
    pub sessions: Arc<dyn SessionStore>,
    #[allow(dead_code)]
    pub config: Config,
}
