use std::sync::Arc;

use crate::core::config::{load_insight_config, InsightConfig};
use crate::tools::insight::{InsightBackend, OpenAiInsightBackend};

#[derive(Clone)]
pub struct AppState {
    pub http_client: reqwest::Client,

    /// File-based config loaded from `analytics-insight.json` (env-var fallback for all fields).
    pub config: Arc<InsightConfig>,

    // Text-generation service behind the insight endpoint; swapped out in tests.
    pub insight_backend: Arc<dyn InsightBackend>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("llm_base_url", &self.config.analysis.resolve_base_url())
            .field("llm_model", &self.config.analysis.resolve_model())
            .finish()
    }
}

impl AppState {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self::with_config(http_client, load_insight_config())
    }

    pub fn with_config(http_client: reqwest::Client, config: InsightConfig) -> Self {
        let insight_backend: Arc<dyn InsightBackend> = Arc::new(OpenAiInsightBackend::new(
            http_client.clone(),
            config.analysis.clone(),
        ));
        Self {
            http_client,
            config: Arc::new(config),
            insight_backend,
        }
    }

    pub fn with_insight_backend(mut self, backend: Arc<dyn InsightBackend>) -> Self {
        self.insight_backend = backend;
        self
    }
}
