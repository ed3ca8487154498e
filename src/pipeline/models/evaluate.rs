use serde::Serialize;

use super::types::Tagger;
use crate::pipeline::extraction::{EntityExtractor, FieldName, RawText};

/// An annotated text with expected values per field.
#[derive(Debug, Clone)]
pub struct EvaluationCase {
    pub text: &'static str,
    pub expected: &'static [(FieldName, &'static str)],
}

pub const BUILTIN_CASES: [EvaluationCase; 2] = [
    EvaluationCase {
        text: "Nom : MARTIN JEAN\nRéférence : 2025-TEST/01-A\nObjet : Test d'analyse\nDate : 15/06/2025\nDemandeur : Service test",
        expected: &[
            (FieldName::PersonName, "MARTIN JEAN"),
            (FieldName::CaseReference, "2025-TEST/01-A"),
            (FieldName::AnalysisType, "Test d'analyse"),
            (FieldName::SamplingDate, "15/06/2025"),
            (FieldName::RequestingService, "Service test"),
        ],
    },
    EvaluationCase {
        text: "Patient : DURAND MARIE\nDossier : 2025-LAB/02-B\nAnalyse : Examen sanguin\nPrélèvement : 20/06/2025\nService : Laboratoire",
        expected: &[
            (FieldName::PersonName, "DURAND MARIE"),
            (FieldName::CaseReference, "2025-LAB/02-B"),
            (FieldName::AnalysisType, "Examen sanguin"),
            (FieldName::SamplingDate, "20/06/2025"),
            (FieldName::RequestingService, "Laboratoire"),
        ],
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub model_id: String,
    pub cases: usize,
    pub expected: usize,
    pub found: usize,
    pub correct: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Score a tagger against annotated cases.
///
/// A found value is correct when it equals the expected one, ignoring case
/// and surrounding whitespace.
pub fn evaluate_tagger(
    model_id: &str,
    tagger: std::sync::Arc<dyn Tagger>,
    cases: &[EvaluationCase],
) -> EvaluationReport {
    let extractor = EntityExtractor::new(Some(tagger));
    let mut expected = 0;
    let mut found = 0;
    let mut correct = 0;

    for case in cases {
        let result = extractor.extract_by_model(&RawText::from(case.text));
        expected += case.expected.len();
        found += result.non_empty_count();
        correct += case
            .expected
            .iter()
            .filter(|(field, want)| {
                result
                    .non_empty(*field)
                    .is_some_and(|got| got.trim().to_lowercase() == want.trim().to_lowercase())
            })
            .count();
    }

    let precision = ratio(correct, found);
    let recall = ratio(correct, expected);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    tracing::info!(model = model_id, precision, recall, f1_score, "Model evaluated");

    EvaluationReport {
        model_id: model_id.to_string(),
        cases: cases.len(),
        expected,
        found,
        correct,
        precision,
        recall,
        f1_score,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
