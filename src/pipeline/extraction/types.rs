use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// The five fields extracted from every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    PersonName,
    CaseReference,
    AnalysisType,
    SamplingDate,
    RequestingService,
}

impl FieldName {
    /// Output order for records and CSV rows.
    pub const ALL: [FieldName; 5] = [
        FieldName::PersonName,
        FieldName::CaseReference,
        FieldName::AnalysisType,
        FieldName::SamplingDate,
        FieldName::RequestingService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::PersonName => "person_name",
            FieldName::CaseReference => "case_reference",
            FieldName::AnalysisType => "analysis_type",
            FieldName::SamplingDate => "sampling_date",
            FieldName::RequestingService => "requesting_service",
        }
    }

    /// French label shown in the upload page.
    pub fn display_label(&self) -> &'static str {
        match self {
            FieldName::PersonName => "Nom de la personne",
            FieldName::CaseReference => "Référence du dossier",
            FieldName::AnalysisType => "Type d'analyse",
            FieldName::SamplingDate => "Date de prélèvement",
            FieldName::RequestingService => "Service demandeur",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text layer of one document, pages joined with `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawText {
    text: String,
}

impl RawText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<String> for RawText {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl From<&str> for RawText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Text of a single page as returned by a [`PdfExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
    /// False when the page's text layer could not be decoded.
    pub readable: bool,
}

/// Trait for PDF text-layer extraction.
pub trait PdfExtractor: Send + Sync {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError>;
}

/// A tagger entity mapped onto a known field.
/// Offsets are character positions into the source text, `start < end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub field: FieldName,
    pub text: String,
}

/// Partial field values produced by one extraction strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateResult {
    values: BTreeMap<FieldName, String>,
}

impl CandidateResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Value for `field` when present and not blank.
    pub fn non_empty(&self, field: FieldName) -> Option<&str> {
        self.get(field).filter(|v| !v.trim().is_empty())
    }

    pub fn insert(&mut self, field: FieldName, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    /// Insert only if the field has no value yet. Returns whether it was stored.
    pub fn insert_first(&mut self, field: FieldName, value: impl Into<String>) -> bool {
        if self.values.contains_key(&field) {
            return false;
        }
        self.values.insert(field, value.into());
        true
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.values.contains_key(&field)
    }

    pub fn non_empty_count(&self) -> usize {
        FieldName::ALL
            .iter()
            .filter(|f| self.non_empty(**f).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Which strategy contributed to the final record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Model,
    Regex,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Model => "model",
            ExtractionMethod::Regex => "regex",
        }
    }
}

/// The five output fields, each `None` when not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub person_name: Option<String>,
    pub case_reference: Option<String>,
    pub analysis_type: Option<String>,
    pub sampling_date: Option<String>,
    pub requesting_service: Option<String>,
}

impl ExtractedFields {
    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: FieldName, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    pub fn found_count(&self) -> usize {
        FieldName::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }

    /// Fields in output order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, Option<&str>)> + '_ {
        FieldName::ALL.into_iter().map(move |f| (f, self.get(f)))
    }

    fn slot(&self, field: FieldName) -> &Option<String> {
        match field {
            FieldName::PersonName => &self.person_name,
            FieldName::CaseReference => &self.case_reference,
            FieldName::AnalysisType => &self.analysis_type,
            FieldName::SamplingDate => &self.sampling_date,
            FieldName::RequestingService => &self.requesting_service,
        }
    }

    fn slot_mut(&mut self, field: FieldName) -> &mut Option<String> {
        match field {
            FieldName::PersonName => &mut self.person_name,
            FieldName::CaseReference => &mut self.case_reference,
            FieldName::AnalysisType => &mut self.analysis_type,
            FieldName::SamplingDate => &mut self.sampling_date,
            FieldName::RequestingService => &mut self.requesting_service,
        }
    }
}

/// Provenance attached to every merged record, serialized as `_metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    #[serde(rename = "extraction_method")]
    pub method_used: ExtractionMethod,
    #[serde(rename = "model_fields")]
    pub model_field_count: usize,
    #[serde(rename = "regex_fields")]
    pub regex_field_count: usize,
    pub text_length: usize,
    #[serde(rename = "model_id")]
    pub active_model_id: Option<String>,
}

/// Final record: five fields plus `_metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedResult {
    #[serde(flatten)]
    pub fields: ExtractedFields,
    #[serde(rename = "_metadata")]
    pub metadata: ExtractionMetadata,
}

impl MergedResult {
    /// The legacy record shape: five fields, no provenance.
    pub fn without_metadata(&self) -> ExtractedFields {
        self.fields.clone()
    }
}
