use std::collections::HashMap;

use super::types::TaggedSpan;
use super::ModelError;

// ═══════════════════════════════════════════════════════════
// Token-classification tagger, behind the `onnx-ner` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-ner")]
mod session {
    use super::{decode_bio, read_id2label, ModelError, TaggedSpan};
    use crate::pipeline::models::Tagger;
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// Token-classification network run with ONNX Runtime.
    ///
    /// Requires three files in the model directory:
    /// - `model.onnx`: the exported network
    /// - `tokenizer.json`: HuggingFace tokenizer definition
    /// - `config.json`: carries the `id2label` table
    ///
    /// ort::Session::run requires `&mut self`, hence the Mutex.
    pub struct OnnxTagger {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
        id2label: Vec<String>,
    }

    impl OnnxTagger {
        pub fn load(model_dir: &Path) -> Result<Self, ModelError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");
            let config_path = model_dir.join("config.json");

            for path in [&model_path, &tokenizer_path, &config_path] {
                if !path.exists() {
                    return Err(ModelError::MissingArtifact(path.clone()));
                }
            }

            let load_err = |reason: String| ModelError::Load {
                location: model_dir.to_path_buf(),
                reason,
            };

            let config = std::fs::read_to_string(&config_path).map_err(|e| load_err(e.to_string()))?;
            let id2label = read_id2label(&config)?;

            let session = Session::builder()
                .map_err(|e: ort::Error| load_err(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| load_err(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| load_err(format!("ONNX load failed: {e}")))?;

            let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| load_err(format!("Tokenizer load failed: {e}")))?;

            tracing::info!(labels = id2label.len(), "ONNX tagger loaded from {}", model_dir.display());

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                id2label,
            })
        }

        fn run(&self, text: &str) -> Result<Vec<TaggedSpan>, ModelError> {
            use ort::value::TensorRef;

            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| ModelError::Inference(format!("Tokenization failed: {e}")))?;

            let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let attention_mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            let seq_len = input_ids.len();

            let ids_array = ndarray::Array2::from_shape_vec((1, seq_len), input_ids)
                .map_err(|e| ModelError::Inference(e.to_string()))?;
            let mask_array = ndarray::Array2::from_shape_vec((1, seq_len), attention_mask)
                .map_err(|e| ModelError::Inference(e.to_string()))?;

            let ids_tensor = TensorRef::from_array_view(&ids_array)
                .map_err(|e| ModelError::Inference(e.to_string()))?;
            let mask_tensor = TensorRef::from_array_view(&mask_array)
                .map_err(|e| ModelError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| ModelError::Inference("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor])
                .map_err(|e| ModelError::Inference(format!("ONNX inference failed: {e}")))?;

            // Logits: [1, seq_len, num_labels]
            let (shape, logits) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| ModelError::Inference(format!("Output extraction: {e}")))?;

            let num_labels = self.id2label.len();
            if shape.len() != 3 || shape[1] as usize != seq_len || shape[2] as usize != num_labels {
                return Err(ModelError::Inference(format!(
                    "Unexpected output shape: {shape:?}, expected [1, {seq_len}, {num_labels}]"
                )));
            }

            let labels: Vec<&str> = logits
                .chunks(num_labels)
                .map(|row| {
                    let best = row
                        .iter()
                        .enumerate()
                        .max_by(|a, b| a.1.total_cmp(b.1))
                        .map(|(i, _)| i)
                        .unwrap_or(0);
                    self.id2label[best].as_str()
                })
                .collect();

            Ok(decode_bio(&labels, encoding.get_offsets(), text))
        }
    }

    impl Tagger for OnnxTagger {
        fn backend_id(&self) -> &str {
            "onnx"
        }

        fn infer(&self, text: &str) -> Result<Vec<TaggedSpan>, ModelError> {
            self.run(text)
        }
    }
}

#[cfg(feature = "onnx-ner")]
pub use session::OnnxTagger;

/// Parse the `id2label` table of a HuggingFace `config.json` into a dense vector.
pub fn read_id2label(config_json: &str) -> Result<Vec<String>, ModelError> {
    #[derive(serde::Deserialize)]
    struct Config {
        id2label: HashMap<String, String>,
    }

    let config: Config = serde_json::from_str(config_json)
        .map_err(|e| ModelError::Descriptor(format!("config.json: {e}")))?;

    let mut labels = vec![String::new(); config.id2label.len()];
    for (id, label) in config.id2label {
        let index: usize = id
            .parse()
            .map_err(|_| ModelError::Descriptor(format!("non-numeric label id: {id}")))?;
        let slot = labels
            .get_mut(index)
            .ok_or_else(|| ModelError::Descriptor(format!("label id out of range: {index}")))?;
        *slot = label;
    }
    if labels.is_empty() {
        return Err(ModelError::Descriptor("config.json: empty id2label".into()));
    }
    Ok(labels)
}

/// Turn per-token BIO labels into entity spans.
///
/// `offsets` are byte ranges into `text`; `(0, 0)` marks special tokens.
/// An `I-` tag that does not continue an open entity of the same type starts one.
pub fn decode_bio(labels: &[&str], offsets: &[(usize, usize)], text: &str) -> Vec<TaggedSpan> {
    let mut spans = Vec::new();
    // (label, byte_start, byte_end)
    let mut open: Option<(String, usize, usize)> = None;

    let mut close = |open: &mut Option<(String, usize, usize)>| {
        if let Some((label, start, end)) = open.take() {
            if let Some(span) = byte_span(text, start, end, label) {
                spans.push(span);
            }
        }
    };

    for (tag, &(start, end)) in labels.iter().zip(offsets) {
        if start == end {
            continue;
        }
        let (prefix, entity) = match tag.split_once('-') {
            Some((p @ ("B" | "I"), e)) => (p, e),
            _ if *tag == "O" => {
                close(&mut open);
                continue;
            }
            _ => ("I", *tag),
        };

        let continues = prefix == "I"
            && matches!(&open, Some((label, _, _)) if label.as_str() == entity);
        if continues {
            if let Some((_, _, open_end)) = open.as_mut() {
                *open_end = end;
            }
        } else {
            close(&mut open);
            open = Some((entity.to_string(), start, end));
        }
    }
    close(&mut open);
    spans
}

fn byte_span(text: &str, start: usize, end: usize, label: String) -> Option<TaggedSpan> {
    let slice = text.get(start..end)?;
    Some(TaggedSpan {
        start: text[..start].chars().count(),
        end: text[..end].chars().count(),
        label,
        text: slice.to_string(),
    })
}
