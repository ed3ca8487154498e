use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::types::{CandidateResult, EntitySpan, FieldName, RawText};
use crate::pipeline::models::{ModelError, TaggedSpan, Tagger};

/// Tagger label → output field.
pub const LABEL_MAPPING: [(&str, FieldName); 5] = [
    ("nom_personne", FieldName::PersonName),
    ("reference_dossier", FieldName::CaseReference),
    ("type_analyse", FieldName::AnalysisType),
    ("date_prelevement", FieldName::SamplingDate),
    ("service_demandeur", FieldName::RequestingService),
];

/// Exact match only; taggers emit the labels they were trained with.
pub fn field_for_label(label: &str) -> Option<FieldName> {
    LABEL_MAPPING
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, field)| *field)
}

pub fn label_for_field(field: FieldName) -> &'static str {
    LABEL_MAPPING
        .iter()
        .find(|(_, f)| *f == field)
        .map(|(label, _)| *label)
        .unwrap_or_default()
}

/// Runs the active tagger over a document and keeps the first span per field.
#[derive(Clone, Default)]
pub struct EntityExtractor {
    tagger: Option<Arc<dyn Tagger>>,
}

impl EntityExtractor {
    pub fn new(tagger: Option<Arc<dyn Tagger>>) -> Self {
        Self { tagger }
    }

    pub fn without_tagger() -> Self {
        Self { tagger: None }
    }

    pub fn backend_id(&self) -> Option<&str> {
        self.tagger.as_deref().map(|t| t.backend_id())
    }

    /// Validated entity spans for known labels, in tagger order.
    pub fn spans(&self, text: &RawText) -> Result<Vec<EntitySpan>, ModelError> {
        let Some(tagger) = &self.tagger else {
            return Ok(Vec::new());
        };
        // A panicking tagger is an inference failure like any other.
        let tagged = panic::catch_unwind(AssertUnwindSafe(|| tagger.infer(text.as_str())))
            .map_err(|payload| {
                ModelError::Inference(format!("tagger panicked: {}", panic_message(&*payload)))
            })??;
        let char_len = text.char_len();
        Ok(tagged
            .into_iter()
            .filter_map(|span| to_entity_span(span, text, char_len))
            .collect())
    }

    /// Field values from the tagger. No tagger, or a tagger failure, yields
    /// an empty result.
    pub fn extract_by_model(&self, text: &RawText) -> CandidateResult {
        let mut result = CandidateResult::new();
        let spans = match self.spans(text) {
            Ok(spans) => spans,
            Err(e) => {
                tracing::warn!(error = %e, "Entity tagger failed, continuing without model values");
                return result;
            }
        };
        for span in spans {
            result.insert_first(span.field, span.text.trim());
        }
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn to_entity_span(span: TaggedSpan, text: &RawText, char_len: usize) -> Option<EntitySpan> {
    let field = field_for_label(&span.label)?;
    if span.start >= span.end || span.end > char_len {
        tracing::warn!(
            label = %span.label,
            start = span.start,
            end = span.end,
            char_len,
            "Dropping entity span with invalid offsets"
        );
        return None;
    }
    let value = if span.text.is_empty() {
        text.as_str()
            .chars()
            .skip(span.start)
            .take(span.end - span.start)
            .collect()
    } else {
        span.text
    };
    Some(EntitySpan {
        start: span.start,
        end: span.end,
        field,
        text: value,
    })
}
