//! Gazetteer tagger: labelled phrase lists matched case-insensitively.
//!
//! Artifact layout: `<location>/patterns.json`, an array of
//! `{"label": "...", "pattern": "..."}` objects.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use super::types::{TaggedSpan, Tagger};
use super::ModelError;

pub const PATTERNS_FILE: &str = "patterns.json";

#[derive(Debug, Clone, Deserialize)]
pub struct PhrasePattern {
    pub label: String,
    pub pattern: String,
}

struct PhraseMatcher {
    label: String,
    regex: Regex,
}

pub struct PhraseTagger {
    matchers: Vec<PhraseMatcher>,
}

impl PhraseTagger {
    pub fn load(location: &Path) -> Result<Self, ModelError> {
        let path = location.join(PATTERNS_FILE);
        if !path.is_file() {
            return Err(ModelError::MissingArtifact(path));
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ModelError::Load {
            location: location.to_path_buf(),
            reason: e.to_string(),
        })?;
        let patterns: Vec<PhrasePattern> =
            serde_json::from_str(&raw).map_err(|e| ModelError::Load {
                location: location.to_path_buf(),
                reason: format!("{PATTERNS_FILE}: {e}"),
            })?;
        let tagger = Self::from_patterns(patterns)?;
        tracing::info!(
            location = %location.display(),
            phrases = tagger.matchers.len(),
            "Phrase tagger loaded"
        );
        Ok(tagger)
    }

    pub fn from_patterns(patterns: Vec<PhrasePattern>) -> Result<Self, ModelError> {
        let matchers = patterns
            .into_iter()
            .filter(|p| !p.pattern.trim().is_empty())
            .map(|p| {
                let regex = RegexBuilder::new(&phrase_regex(p.pattern.trim()))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ModelError::Descriptor(e.to_string()))?;
                Ok(PhraseMatcher {
                    label: p.label,
                    regex,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;
        Ok(Self { matchers })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escape the phrase; add word boundaries only where the phrase edge is a word character.
fn phrase_regex(phrase: &str) -> String {
    let starts_word = phrase.chars().next().is_some_and(is_word_char);
    let ends_word = phrase.chars().last().is_some_and(is_word_char);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(phrase),
        if ends_word { r"\b" } else { "" }
    )
}

impl Tagger for PhraseTagger {
    fn backend_id(&self) -> &str {
        "phrase"
    }

    fn infer(&self, text: &str) -> Result<Vec<TaggedSpan>, ModelError> {
        // (byte_start, byte_end, label index)
        let mut hits: Vec<(usize, usize, usize)> = self
            .matchers
            .iter()
            .enumerate()
            .flat_map(|(i, m)| m.regex.find_iter(text).map(move |hit| (hit.start(), hit.end(), i)))
            .collect();

        // Earliest first, longest first on ties; drop overlaps.
        hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        let mut spans = Vec::new();
        let mut cursor = 0usize;
        for (start, end, i) in hits {
            if start < cursor {
                continue;
            }
            cursor = end;
            spans.push(TaggedSpan {
                start: text[..start].chars().count(),
                end: text[..end].chars().count(),
                label: self.matchers[i].label.clone(),
                text: text[start..end].to_string(),
            });
        }
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagger(pairs: &[(&str, &str)]) -> PhraseTagger {
        PhraseTagger::from_patterns(
            pairs
                .iter()
                .map(|(label, pattern)| PhrasePattern {
                    label: label.to_string(),
                    pattern: pattern.to_string(),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn matches_case_insensitively_with_char_offsets() {
        let t = tagger(&[("service_demandeur", "Police Nationale")]);
        let spans = t.infer("Réf : demandé par la police nationale").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "police nationale");
        assert_eq!(spans[0].start, 21);
        assert_eq!(spans[0].end, 37);
    }

    #[test]
    fn respects_word_boundaries() {
        let t = tagger(&[("nom_personne", "MARTIN")]);
        assert!(t.infer("MARTINEZ").unwrap().is_empty());
        assert_eq!(t.infer("Nom : MARTIN").unwrap().len(), 1);
    }

    #[test]
    fn punctuation_edges_still_match() {
        let t = tagger(&[("reference_dossier", "2025-TEST/01-A")]);
        let spans = t.infer("Référence : 2025-TEST/01-A.").unwrap();
        assert_eq!(spans[0].label, "reference_dossier");
    }

    #[test]
    fn overlapping_hits_keep_longest() {
        let t = tagger(&[
            ("service_demandeur", "Police"),
            ("service_demandeur", "Police Nationale"),
        ]);
        let spans = t.infer("Police Nationale").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Police Nationale");
    }

    #[test]
    fn load_reads_patterns_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(PATTERNS_FILE),
            r#"[{"label": "type_analyse", "pattern": "analyse toxicologique"}]"#,
        )
        .unwrap();
        let t = PhraseTagger::load(tmp.path()).unwrap();
        let spans = t.infer("Objet : Analyse toxicologique").unwrap();
        assert_eq!(spans[0].label, "type_analyse");
    }

    #[test]
    fn load_without_file_is_missing_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            PhraseTagger::load(tmp.path()),
            Err(ModelError::MissingArtifact(_))
        ));
    }

    #[test]
    fn load_with_bad_json_is_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(PATTERNS_FILE), "not json").unwrap();
        assert!(matches!(
            PhraseTagger::load(tmp.path()),
            Err(ModelError::Load { .. })
        ));
    }
}
