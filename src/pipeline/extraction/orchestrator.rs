use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::entities::EntityExtractor;
use super::merge::{compare, ComparisonReport, ResultMerger};
use super::patterns::PatternExtractor;
use super::pdf::TextAcquirer;
use super::types::{MergedResult, RawText};
use super::ExtractionError;
use crate::pipeline::models::ModelRegistry;

/// Runs both strategies over a document and merges them.
///
/// `model` arguments select a tagger by id for one call; `None` means the
/// registry's active tagger. An unknown id degrades to patterns only.
pub struct ExtractionPipeline {
    acquirer: TextAcquirer,
    patterns: &'static PatternExtractor,
    registry: Arc<ModelRegistry>,
}

impl ExtractionPipeline {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self::with_acquirer(registry, TextAcquirer::default())
    }

    pub fn with_acquirer(registry: Arc<ModelRegistry>, acquirer: TextAcquirer) -> Self {
        Self {
            acquirer,
            patterns: PatternExtractor::french(),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    fn entity_extractor(&self, model: Option<&str>) -> (EntityExtractor, Option<String>) {
        match model {
            Some(id) => match self.registry.get(id) {
                Some(tagger) => (EntityExtractor::new(Some(tagger)), Some(id.to_string())),
                None => {
                    tracing::warn!(model = id, "Requested model unavailable, using patterns only");
                    (EntityExtractor::without_tagger(), None)
                }
            },
            None => match self.registry.active() {
                Some((id, tagger)) => (EntityExtractor::new(Some(tagger)), Some(id)),
                None => (EntityExtractor::without_tagger(), None),
            },
        }
    }

    /// Extract from already-acquired text. Never fails.
    pub fn extract_text(&self, text: &RawText, model: Option<&str>) -> MergedResult {
        let (entities, model_id) = self.entity_extractor(model);
        let model_result = entities.extract_by_model(text);
        let regex_result = self.patterns.extract_by_pattern(text.as_str());
        let merged = ResultMerger::merge(
            &model_result,
            &regex_result,
            text.char_len(),
            model_id.as_deref(),
        );

        tracing::info!(
            method = merged.metadata.method_used.as_str(),
            model = model_id.as_deref().unwrap_or("-"),
            found = merged.fields.found_count(),
            chars = merged.metadata.text_length,
            "Extraction complete"
        );
        merged
    }

    /// Read a PDF and extract from it. Only an unreadable document fails.
    pub fn extract_file(&self, path: &Path, model: Option<&str>) -> Result<MergedResult, ExtractionError> {
        let text = self.acquirer.read(path)?;
        Ok(self.extract_text(&text, model))
    }

    pub fn compare_text(&self, text: &RawText, model: Option<&str>) -> ComparisonReport {
        let (entities, _) = self.entity_extractor(model);
        compare(
            &entities.extract_by_model(text),
            &self.patterns.extract_by_pattern(text.as_str()),
        )
    }

    pub fn compare_file(&self, path: &Path, model: Option<&str>) -> Result<ComparisonReport, ExtractionError> {
        let text = self.acquirer.read(path)?;
        Ok(self.compare_text(&text, model))
    }

    /// Read on a blocking thread, bounded by `read_timeout`.
    pub async fn read_document(
        &self,
        path: PathBuf,
        read_timeout: Duration,
    ) -> Result<RawText, ExtractionError> {
        let acquirer = self.acquirer.clone();
        let shown = path.display().to_string();
        let task = tokio::task::spawn_blocking(move || acquirer.read(&path));

        match tokio::time::timeout(read_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ExtractionError::read(shown, format!("reader task failed: {e}"))),
            Err(_) => {
                tracing::warn!(path = %shown, ?read_timeout, "Document read timed out");
                Err(ExtractionError::ReadTimeout {
                    timeout: read_timeout,
                })
            }
        }
    }

    /// Async entry point used by the upload server.
    pub async fn extract_document(
        self: &Arc<Self>,
        path: PathBuf,
        model: Option<String>,
        read_timeout: Duration,
    ) -> Result<MergedResult, ExtractionError> {
        let text = self.read_document(path, read_timeout).await?;
        let pipeline = Arc::clone(self);
        tokio::task::spawn_blocking(move || pipeline.extract_text(&text, model.as_deref()))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::test_support::{
        make_report_pdf, PanickingTagger, StubTagger, STANDARD_REPORT_LINES,
    };
    use crate::pipeline::extraction::types::{ExtractionMethod, FieldName, PageText, PdfExtractor};
    use crate::pipeline::models::{ModelError, ModelLocation, TaggerLoader, Tagger, WELL_KNOWN_LOCATIONS};

    const STANDARD_REPORT: &str = "Nom : MARTIN JEAN\nRéférence : 2025-TEST/01-A\nObjet : Test d'analyse\nDate : 15/06/2025\nDemandeur : Service test";

    /// Loader that serves a prepared tagger for every existing directory.
    struct FixedLoader(Arc<dyn Tagger>);

    impl TaggerLoader for FixedLoader {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn load(&self, _location: &Path) -> Result<Arc<dyn Tagger>, ModelError> {
            Ok(Arc::clone(&self.0))
        }
    }

    fn empty_registry() -> (Arc<ModelRegistry>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let registry = Arc::new(ModelRegistry::new(tmp.path()));
        registry.initialize(None);
        (registry, tmp)
    }

    fn registry_with(tagger: StubTagger, dirs: &[&str]) -> (Arc<ModelRegistry>, tempfile::TempDir) {
        registry_serving(Arc::new(tagger), dirs)
    }

    fn registry_serving(
        tagger: Arc<dyn Tagger>,
        dirs: &[&str],
    ) -> (Arc<ModelRegistry>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        for dir in dirs {
            std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        let locations: Vec<ModelLocation> = WELL_KNOWN_LOCATIONS.to_vec();
        let registry = Arc::new(ModelRegistry::with_loaders(
            tmp.path(),
            locations,
            vec![Box::new(FixedLoader(tagger))],
        ));
        registry.initialize(None);
        (registry, tmp)
    }

    #[test]
    fn patterns_only_standard_report() {
        let (registry, _tmp) = empty_registry();
        let pipeline = ExtractionPipeline::new(registry);

        let merged = pipeline.extract_text(&RawText::from(STANDARD_REPORT), None);
        assert_eq!(merged.fields.person_name.as_deref(), Some("MARTIN JEAN"));
        assert_eq!(merged.fields.case_reference.as_deref(), Some("2025-TEST/01-A"));
        assert_eq!(merged.fields.analysis_type.as_deref(), Some("Test d'analyse"));
        assert_eq!(merged.fields.sampling_date.as_deref(), Some("15/06/2025"));
        assert_eq!(merged.fields.requesting_service.as_deref(), Some("Service test"));
        assert_eq!(merged.metadata.method_used, ExtractionMethod::Regex);
        assert_eq!(merged.metadata.model_field_count, 0);
        assert_eq!(merged.metadata.regex_field_count, 5);
        assert!(merged.metadata.active_model_id.is_none());
    }

    #[test]
    fn document_without_markers() {
        let (registry, _tmp) = empty_registry();
        let pipeline = ExtractionPipeline::new(registry);
        let text = RawText::from("Ceci est un document sans aucune information utile.");

        let merged = pipeline.extract_text(&text, None);
        assert_eq!(merged.fields.found_count(), 0);
        assert_eq!(merged.metadata.regex_field_count, 0);
        assert_eq!(merged.metadata.model_field_count, 0);
        assert_eq!(merged.metadata.method_used, ExtractionMethod::Regex);
        assert_eq!(merged.metadata.text_length, text.char_len());
    }

    #[test]
    fn tagger_value_beats_pattern() {
        let text = "Nom : DUPONT\nPatiente DUPONT MARIE, le 01/02/2025";
        let tagger = StubTagger::new("stub").span(22, 34, "nom_personne", "DUPONT MARIE");
        let (registry, _tmp) = registry_with(tagger, &["general_model"]);
        let pipeline = ExtractionPipeline::new(registry);

        let merged = pipeline.extract_text(&RawText::from(text), None);
        assert_eq!(merged.fields.person_name.as_deref(), Some("DUPONT MARIE"));
        assert_eq!(merged.fields.sampling_date.as_deref(), Some("01/02/2025"));
        assert_eq!(merged.metadata.method_used, ExtractionMethod::Model);
        assert_eq!(merged.metadata.model_field_count, 1);
        assert_eq!(merged.metadata.active_model_id.as_deref(), Some("general"));
    }

    #[test]
    fn unknown_requested_model_degrades_to_patterns() {
        let tagger = StubTagger::new("stub").span(6, 17, "nom_personne", "MARTIN JEAN");
        let (registry, _tmp) = registry_with(tagger, &["general_model"]);
        let pipeline = ExtractionPipeline::new(registry);

        let merged = pipeline.extract_text(&RawText::from(STANDARD_REPORT), Some("legal"));
        assert_eq!(merged.metadata.method_used, ExtractionMethod::Regex);
        assert!(merged.metadata.active_model_id.is_none());
        assert_eq!(merged.fields.found_count(), 5);
    }

    #[test]
    fn requested_model_does_not_change_active() {
        let tagger = StubTagger::new("stub").span(6, 17, "nom_personne", "MARTIN JEAN");
        let (registry, _tmp) = registry_with(tagger, &["general_model", "medical_model"]);
        let pipeline = ExtractionPipeline::new(Arc::clone(&registry));

        let merged = pipeline.extract_text(&RawText::from(STANDARD_REPORT), Some("medical"));
        assert_eq!(merged.metadata.active_model_id.as_deref(), Some("medical"));
        assert_eq!(registry.active_id().as_deref(), Some("general"));
    }

    #[test]
    fn extraction_is_idempotent() {
        let (registry, _tmp) = empty_registry();
        let pipeline = ExtractionPipeline::new(registry);
        let text = RawText::from(STANDARD_REPORT);
        assert_eq!(pipeline.extract_text(&text, None), pipeline.extract_text(&text, None));
    }

    #[test]
    fn every_field_is_present_in_output() {
        let (registry, _tmp) = empty_registry();
        let pipeline = ExtractionPipeline::new(registry);
        let merged = pipeline.extract_text(&RawText::from("Objet : Recherche ADN\n"), None);

        let json = serde_json::to_value(&merged).unwrap();
        for field in FieldName::ALL {
            assert!(json.get(field.as_str()).is_some(), "missing key {field}");
        }
        for (_, value) in merged.fields.iter() {
            if let Some(v) = value {
                assert!(!v.is_empty());
            }
        }
    }

    #[test]
    fn extract_file_from_pdf() {
        let (registry, tmp) = empty_registry();
        let path = tmp.path().join("rapport.pdf");
        std::fs::write(&path, make_report_pdf(&STANDARD_REPORT_LINES)).unwrap();
        let pipeline = ExtractionPipeline::new(registry);

        let merged = pipeline.extract_file(&path, None).unwrap();
        assert_eq!(merged.fields.person_name.as_deref(), Some("MARTIN JEAN"));
        assert_eq!(merged.fields.case_reference.as_deref(), Some("2025-TEST/01-A"));
        assert_eq!(merged.fields.sampling_date.as_deref(), Some("15/06/2025"));
    }

    #[test]
    fn corrupt_file_fails_with_document_read() {
        let (registry, tmp) = empty_registry();
        let path = tmp.path().join("corrupt.pdf");
        std::fs::write(&path, b"\x00\x01garbage bytes").unwrap();
        let pipeline = ExtractionPipeline::new(registry);

        let result = pipeline.extract_file(&path, None);
        assert!(matches!(result, Err(ExtractionError::DocumentRead { .. })));
    }

    #[test]
    fn compare_reports_both_sides() {
        let tagger = StubTagger::new("stub").span(6, 17, "nom_personne", "MARTIN JEAN");
        let (registry, _tmp) = registry_with(tagger, &["general_model"]);
        let pipeline = ExtractionPipeline::new(registry);

        let report = pipeline.compare_text(&RawText::from(STANDARD_REPORT), None);
        assert_eq!(report.fields.len(), 5);
        // Name found by both with equal value, four fields by patterns only.
        assert_eq!(report.model_score, 0.5);
        assert_eq!(report.regex_score, 4.5);
    }

    struct SlowExtractor;

    impl PdfExtractor for SlowExtractor {
        fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn slow_read_times_out() {
        let (registry, tmp) = empty_registry();
        let path = tmp.path().join("slow.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        let pipeline = Arc::new(ExtractionPipeline::with_acquirer(
            registry,
            TextAcquirer::new(Arc::new(SlowExtractor)),
        ));

        let result = pipeline
            .extract_document(path, None, Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(ExtractionError::ReadTimeout { .. })));
    }

    #[tokio::test]
    async fn async_extraction_matches_sync() {
        let (registry, tmp) = empty_registry();
        let path = tmp.path().join("rapport.pdf");
        std::fs::write(&path, make_report_pdf(&STANDARD_REPORT_LINES)).unwrap();
        let pipeline = Arc::new(ExtractionPipeline::new(registry));

        let sync = pipeline.extract_file(&path, None).unwrap();
        let async_result = pipeline
            .extract_document(path, None, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(sync, async_result);
    }

    #[tokio::test]
    async fn panicking_tagger_degrades_to_patterns() {
        let (registry, tmp) = registry_serving(Arc::new(PanickingTagger), &["general_model"]);
        assert_eq!(registry.active_id().as_deref(), Some("general"));
        let path = tmp.path().join("rapport.pdf");
        std::fs::write(&path, make_report_pdf(&STANDARD_REPORT_LINES)).unwrap();
        let pipeline = Arc::new(ExtractionPipeline::new(registry));

        let merged = pipeline
            .extract_document(path, None, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(merged.metadata.method_used, ExtractionMethod::Regex);
        assert_eq!(merged.fields.person_name.as_deref(), Some("MARTIN JEAN"));
    }
}
