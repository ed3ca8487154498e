use serde::Serialize;

use super::types::{
    CandidateResult, ExtractedFields, ExtractionMetadata, ExtractionMethod, FieldName,
    MergedResult,
};

/// Combines model and pattern candidates field by field.
pub struct ResultMerger;

impl ResultMerger {
    /// Per field: the model value when non-empty, else the pattern value
    /// when non-empty, else absent.
    pub fn merge(
        model: &CandidateResult,
        regex: &CandidateResult,
        text_length: usize,
        active_model_id: Option<&str>,
    ) -> MergedResult {
        let mut fields = ExtractedFields::default();
        for field in FieldName::ALL {
            let value = model
                .non_empty(field)
                .or_else(|| regex.non_empty(field))
                .map(str::to_string);
            fields.set(field, value);
        }

        let model_field_count = model.non_empty_count();
        let method_used = if model_field_count > 0 {
            ExtractionMethod::Model
        } else {
            ExtractionMethod::Regex
        };

        MergedResult {
            fields,
            metadata: ExtractionMetadata {
                method_used,
                model_field_count,
                regex_field_count: regex.non_empty_count(),
                text_length,
                active_model_id: active_model_id.map(str::to_string),
            },
        }
    }
}

/// Which strategy did better on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonWinner {
    Model,
    Regex,
    Tie,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldComparison {
    pub field: FieldName,
    pub model_value: Option<String>,
    pub regex_value: Option<String>,
    pub winner: ComparisonWinner,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub fields: Vec<FieldComparison>,
    pub model_score: f64,
    pub regex_score: f64,
}

/// Side-by-side view of both strategies.
///
/// A field found only by one side goes to that side; found by both with the
/// same value (case-insensitive) is a tie; differing values go to the model.
pub fn compare(model: &CandidateResult, regex: &CandidateResult) -> ComparisonReport {
    let mut model_score = 0.0;
    let mut regex_score = 0.0;

    let fields: Vec<FieldComparison> = FieldName::ALL
        .into_iter()
        .map(|field| {
            let m = model.non_empty(field);
            let r = regex.non_empty(field);
            let winner = match (m, r) {
                (Some(a), Some(b)) if a.trim().to_lowercase() == b.trim().to_lowercase() => {
                    ComparisonWinner::Tie
                }
                (Some(_), _) => ComparisonWinner::Model,
                (None, Some(_)) => ComparisonWinner::Regex,
                (None, None) => ComparisonWinner::None,
            };
            match winner {
                ComparisonWinner::Model => model_score += 1.0,
                ComparisonWinner::Regex => regex_score += 1.0,
                ComparisonWinner::Tie => {
                    model_score += 0.5;
                    regex_score += 0.5;
                }
                ComparisonWinner::None => {}
            }
            FieldComparison {
                field,
                model_value: m.map(str::to_string),
                regex_value: r.map(str::to_string),
                winner,
            }
        })
        .collect();

    ComparisonReport {
        fields,
        model_score,
        regex_score,
    }
}
