use std::sync::Arc;

use crate::config::AppConfig;
use crate::pipeline::extraction::ExtractionPipeline;
use crate::pipeline::models::ModelRegistry;

/// Shared state for all routes.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<ExtractionPipeline>,
    pub config: Arc<AppConfig>,
}

impl ApiContext {
    pub fn new(pipeline: Arc<ExtractionPipeline>, config: AppConfig) -> Self {
        Self {
            pipeline,
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        self.pipeline.registry()
    }
}
