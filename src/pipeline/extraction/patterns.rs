//! Pattern-based field extraction.
//!
//! The rule table is plain data: for each field, an ordered list of
//! case-insensitive, multi-line patterns. Capture group 1 is the value.
//! The first pattern producing a value longer than one character wins.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use super::types::{CandidateResult, FieldName};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Invalid pattern for {field}: {reason}")]
    InvalidPattern { field: FieldName, reason: String },

    #[error("Pattern {pattern_index} for {field} has no capture group")]
    MissingCaptureGroup {
        field: FieldName,
        pattern_index: usize,
    },
}

/// Post-processing applied to an accepted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    Keep,
    Uppercase,
    /// Capitalize when the value contains one of the keywords (case-insensitive).
    CapitalizeIfContains(&'static [&'static str]),
}

impl Normalization {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Normalization::Keep => value.to_string(),
            Normalization::Uppercase => value.to_uppercase(),
            Normalization::CapitalizeIfContains(keywords) => {
                let lower = value.to_lowercase();
                if keywords.iter().any(|k| lower.contains(k)) {
                    capitalize(value)
                } else {
                    value.to_string()
                }
            }
        }
    }
}

/// Upper-case the first character, lower-case the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    pub pattern: &'static str,
    pub normalization: Normalization,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldPatterns {
    pub field: FieldName,
    pub rules: &'static [PatternRule],
}

const fn rule(pattern: &'static str, normalization: Normalization) -> PatternRule {
    PatternRule {
        pattern,
        normalization,
    }
}

const SERVICE_KEYWORDS: &[&str] = &["police", "gendarmerie"];

/// Rules for French analysis reports, tried in order per field.
pub static FRENCH_REPORT_PATTERNS: &[FieldPatterns] = &[
    FieldPatterns {
        field: FieldName::PersonName,
        rules: &[
            rule(
                r"(?:Nom|Patient|Nom\s*du\s*patient)\s*:?\s*([A-Z][A-Z\s\-]+?)(?:\n|$)",
                Normalization::Uppercase,
            ),
            // Honorific followed by a name on the same line.
            rule(
                r"\b(?:M\.|Mme|Mr|Madame|Monsieur)\s+([A-Z][A-Z \t\-]+)",
                Normalization::Uppercase,
            ),
            rule(
                r"(?:Identité|Malade)\s*[:\s]*([A-Z][A-Z\s\-]+?)(?:\n|$)",
                Normalization::Uppercase,
            ),
        ],
    },
    FieldPatterns {
        field: FieldName::CaseReference,
        rules: &[
            rule(
                r"(?:Référence|Réf\.?|Reference|N°\s*dossier)\s*:?\s*([\w\-/]+)",
                Normalization::Keep,
            ),
            rule(r"(?:Dossier|IPP)\s*:?\s*([\w\-/]+)", Normalization::Keep),
        ],
    },
    FieldPatterns {
        field: FieldName::AnalysisType,
        rules: &[
            rule(
                r"(?:Objet|Type\s*d['’]analyse|Analyse|Examen)\s*:?\s*(.+?)(?:\n|$)",
                Normalization::Keep,
            ),
            rule(
                r"(?:Prélèvement|Échantillon)\s*:?\s*(.+?)(?:\n|$)",
                Normalization::Keep,
            ),
            rule(r"(?:Diagnostic|Bilan)\s*:?\s*(.+?)(?:\n|$)", Normalization::Keep),
        ],
    },
    FieldPatterns {
        field: FieldName::SamplingDate,
        rules: &[
            rule(
                r"(?:Date\s*de\s*prélèvement|Date\s*prélèvement|Prélevé\s*le|Date)\s*:?\s*(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{4})",
                Normalization::Keep,
            ),
            rule(
                r"(?:Réalisé|Effectué|Prélevé)\s*[:\s]*(?:le\s+)?(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{4})",
                Normalization::Keep,
            ),
            // Any date in the document.
            rule(r"(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{4})", Normalization::Keep),
        ],
    },
    FieldPatterns {
        field: FieldName::RequestingService,
        rules: &[
            rule(
                r"(?:Demandeur|Service|Demandé\s*par)\s*:?\s*([^:\n]+?)(?:\n|$)",
                Normalization::CapitalizeIfContains(SERVICE_KEYWORDS),
            ),
            rule(
                r"(?:Prescripteur|Unité|Département)\s*:?\s*([^:\n]+?)(?:\n|$)",
                Normalization::CapitalizeIfContains(SERVICE_KEYWORDS),
            ),
            rule(
                r"(Police|Gendarmerie|Laboratoire|Hôpital|Clinique|Centre)",
                Normalization::CapitalizeIfContains(SERVICE_KEYWORDS),
            ),
        ],
    },
];

struct CompiledRule {
    regex: Regex,
    normalization: Normalization,
}

struct CompiledField {
    field: FieldName,
    rules: Result<Vec<CompiledRule>, PatternError>,
}

/// Applies a [`FieldPatterns`] table to raw text.
pub struct PatternExtractor {
    fields: Vec<CompiledField>,
}

static FRENCH_EXTRACTOR: LazyLock<PatternExtractor> =
    LazyLock::new(|| PatternExtractor::new(FRENCH_REPORT_PATTERNS));

impl PatternExtractor {
    /// Compile a rule table. A field whose rules fail to compile is kept
    /// and reported as absent on every extraction.
    pub fn new(table: &[FieldPatterns]) -> Self {
        let fields = table
            .iter()
            .map(|entry| {
                let rules = compile_rules(entry);
                if let Err(e) = &rules {
                    tracing::warn!(field = %entry.field, error = %e, "Pattern rules rejected");
                }
                CompiledField {
                    field: entry.field,
                    rules,
                }
            })
            .collect();
        Self { fields }
    }

    /// Shared extractor for the built-in French rule table.
    pub fn french() -> &'static PatternExtractor {
        &FRENCH_EXTRACTOR
    }

    /// Extract every field the table knows about.
    ///
    /// A failing field is logged and left absent; other fields are unaffected.
    pub fn extract_by_pattern(&self, text: &str) -> CandidateResult {
        let mut result = CandidateResult::new();
        for compiled in &self.fields {
            match extract_field(compiled, text) {
                Ok(Some(value)) => {
                    result.insert_first(compiled.field, value);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(field = %compiled.field, error = %e, "Pattern extraction failed");
                }
            }
        }
        result
    }
}

fn compile_rules(entry: &FieldPatterns) -> Result<Vec<CompiledRule>, PatternError> {
    entry
        .rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let regex = RegexBuilder::new(rule.pattern)
                .case_insensitive(true)
                .multi_line(true)
                .build()
                .map_err(|e| PatternError::InvalidPattern {
                    field: entry.field,
                    reason: e.to_string(),
                })?;
            if regex.captures_len() < 2 {
                return Err(PatternError::MissingCaptureGroup {
                    field: entry.field,
                    pattern_index: index,
                });
            }
            Ok(CompiledRule {
                regex,
                normalization: rule.normalization,
            })
        })
        .collect()
}

fn extract_field(compiled: &CompiledField, text: &str) -> Result<Option<String>, PatternError> {
    let rules = compiled.rules.as_ref().map_err(Clone::clone)?;
    for (index, rule) in rules.iter().enumerate() {
        let Some(captures) = rule.regex.captures(text) else {
            continue;
        };
        let Some(group) = captures.get(1) else {
            continue;
        };
        let value = group.as_str().trim();
        if value.chars().count() <= 1 {
            tracing::debug!(field = %compiled.field, pattern = index, "Single-character match ignored");
            continue;
        }
        return Ok(Some(rule.normalization.apply(value)));
    }
    Ok(None)
}
