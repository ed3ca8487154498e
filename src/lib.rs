pub mod api;
pub mod config;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::pipeline::extraction::ExtractionPipeline;
use crate::pipeline::models::ModelRegistry;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Scan the models directory and build the pipeline around it.
pub fn bootstrap(config: &AppConfig) -> Arc<ExtractionPipeline> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let registry = Arc::new(ModelRegistry::new(config.models_dir.clone()));
    registry.initialize(config.preferred_model.as_deref());

    match registry.active_id() {
        Some(id) => tracing::info!(model = %id, "Active model selected"),
        None => tracing::warn!(
            models_dir = %config.models_dir.display(),
            "No model available, extraction will use patterns only"
        ),
    }

    Arc::new(ExtractionPipeline::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::RawText;

    #[test]
    fn bootstrap_without_models_runs_patterns_only() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            models_dir: tmp.path().join("models"),
            ..AppConfig::default()
        };
        let pipeline = bootstrap(&config);
        assert!(pipeline.registry().active_id().is_none());

        let text = "Nom : DURAND PAUL\nDate de prélèvement : 12/03/2024";
        let merged = pipeline.extract_text(&RawText::from(text), None);
        assert_eq!(
            merged.fields.person_name.as_deref(),
            Some("DURAND PAUL")
        );
    }

    #[test]
    fn init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
