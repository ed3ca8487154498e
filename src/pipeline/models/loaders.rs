use std::path::Path;
use std::sync::Arc;

use super::phrase::PhraseTagger;
use super::types::Tagger;
use super::ModelError;

/// Knows how to turn one kind of on-disk artifact into a [`Tagger`].
pub trait TaggerLoader: Send + Sync {
    fn name(&self) -> &'static str;

    fn load(&self, location: &Path) -> Result<Arc<dyn Tagger>, ModelError>;
}

/// Phrase lists in `patterns.json`.
pub struct PhraseTaggerLoader;

impl TaggerLoader for PhraseTaggerLoader {
    fn name(&self) -> &'static str {
        "phrase"
    }

    fn load(&self, location: &Path) -> Result<Arc<dyn Tagger>, ModelError> {
        Ok(Arc::new(PhraseTagger::load(location)?))
    }
}

/// Token-classification networks exported to ONNX.
#[cfg(feature = "onnx-ner")]
pub struct OnnxTaggerLoader;

#[cfg(feature = "onnx-ner")]
impl TaggerLoader for OnnxTaggerLoader {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn load(&self, location: &Path) -> Result<Arc<dyn Tagger>, ModelError> {
        Ok(Arc::new(super::onnx::OnnxTagger::load(location)?))
    }
}

/// Loaders in preference order.
pub fn default_loaders() -> Vec<Box<dyn TaggerLoader>> {
    let mut loaders: Vec<Box<dyn TaggerLoader>> = Vec::new();
    #[cfg(feature = "onnx-ner")]
    loaders.push(Box::new(OnnxTaggerLoader));
    loaders.push(Box::new(PhraseTaggerLoader));
    loaders
}

/// Try each loader in order; the first success wins.
pub fn load_first_success(
    loaders: &[Box<dyn TaggerLoader>],
    location: &Path,
) -> Result<(Arc<dyn Tagger>, &'static str), ModelError> {
    if !location.is_dir() {
        return Err(ModelError::NotFound(location.to_path_buf()));
    }

    let mut attempts = Vec::with_capacity(loaders.len());
    for loader in loaders {
        match loader.load(location) {
            Ok(tagger) => return Ok((tagger, loader.name())),
            Err(e) => {
                tracing::debug!(loader = loader.name(), location = %location.display(), error = %e, "Loader declined");
                attempts.push(format!("{}: {e}", loader.name()));
            }
        }
    }

    Err(ModelError::NoLoaderAccepted {
        location: location.to_path_buf(),
        attempts: attempts.join("; "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::TaggedSpan;

    struct NamedLoader(&'static str, bool);

    struct Named(&'static str);

    impl Tagger for Named {
        fn backend_id(&self) -> &str {
            self.0
        }

        fn infer(&self, _text: &str) -> Result<Vec<TaggedSpan>, ModelError> {
            Ok(vec![])
        }
    }

    impl TaggerLoader for NamedLoader {
        fn name(&self) -> &'static str {
            self.0
        }

        fn load(&self, location: &Path) -> Result<Arc<dyn Tagger>, ModelError> {
            if self.1 {
                Ok(Arc::new(Named(self.0)))
            } else {
                Err(ModelError::MissingArtifact(location.join("weights.bin")))
            }
        }
    }

    #[test]
    fn first_success_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let loaders: Vec<Box<dyn TaggerLoader>> = vec![
            Box::new(NamedLoader("first", false)),
            Box::new(NamedLoader("second", true)),
            Box::new(NamedLoader("third", true)),
        ];
        let (tagger, name) = load_first_success(&loaders, tmp.path()).unwrap();
        assert_eq!(name, "second");
        assert_eq!(tagger.backend_id(), "second");
    }

    #[test]
    fn all_failures_are_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let loaders: Vec<Box<dyn TaggerLoader>> = vec![
            Box::new(NamedLoader("first", false)),
            Box::new(NamedLoader("second", false)),
        ];
        match load_first_success(&loaders, tmp.path()) {
            Err(ModelError::NoLoaderAccepted { attempts, .. }) => {
                assert!(attempts.contains("first"));
                assert!(attempts.contains("second"));
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn missing_location_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let loaders = default_loaders();
        let result = load_first_success(&loaders, &tmp.path().join("nope"));
        assert!(matches!(result, Err(ModelError::NotFound(_))));
    }

    #[test]
    fn phrase_loader_is_always_registered() {
        let names: Vec<&str> = default_loaders().iter().map(|l| l.name()).collect();
        assert_eq!(names.last(), Some(&"phrase"));
    }
}
