pub mod types;
pub mod loaders;
pub mod phrase;
pub mod onnx;
pub mod registry;
pub mod evaluate;

pub use types::*;
pub use loaders::*;
pub use phrase::PhraseTagger;
pub use registry::*;
pub use evaluate::*;

#[cfg(feature = "onnx-ner")]
pub use onnx::OnnxTagger;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model location not found: {0}")]
    NotFound(PathBuf),

    #[error("Missing model artifact: {0}")]
    MissingArtifact(PathBuf),

    #[error("Failed to load model at {location}: {reason}")]
    Load { location: PathBuf, reason: String },

    #[error("No loader accepted {location} (tried: {attempts})")]
    NoLoaderAccepted { location: PathBuf, attempts: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Invalid model descriptor: {0}")]
    Descriptor(String),
}
