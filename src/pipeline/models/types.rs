use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ModelError;

/// Raw entity reported by a tagger. Offsets are in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
    pub text: String,
}

/// A loaded entity-recognition backend.
///
/// Implementations must be safe to call from several requests at once.
pub trait Tagger: Send + Sync {
    /// Identifier of the backend that produced this tagger (e.g. `phrase`, `onnx`).
    fn backend_id(&self) -> &str;

    fn infer(&self, text: &str) -> Result<Vec<TaggedSpan>, ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Stock French tagger shipped without domain training.
    Default,
    /// Trained on annotated reports.
    Trained,
}

/// A well-known place where a tagger may live, relative to the models root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLocation {
    pub id: &'static str,
    pub dir_name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub kind: ModelKind,
}

pub const DEFAULT_MODEL_ID: &str = "default";
pub const GENERAL_MODEL_ID: &str = "general";

pub const WELL_KNOWN_LOCATIONS: [ModelLocation; 4] = [
    ModelLocation {
        id: DEFAULT_MODEL_ID,
        dir_name: "default_model",
        display_name: "Modèle par défaut",
        description: "Modèle français général",
        kind: ModelKind::Default,
    },
    ModelLocation {
        id: GENERAL_MODEL_ID,
        dir_name: "general_model",
        display_name: "Modèle général entraîné",
        description: "Modèle entraîné sur des rapports d'analyse",
        kind: ModelKind::Trained,
    },
    ModelLocation {
        id: "medical",
        dir_name: "medical_model",
        display_name: "Modèle médical",
        description: "Modèle spécialisé pour les rapports médicaux",
        kind: ModelKind::Trained,
    },
    ModelLocation {
        id: "legal",
        dir_name: "legal_model",
        display_name: "Modèle juridique",
        description: "Modèle spécialisé pour les rapports juridiques",
        kind: ModelKind::Trained,
    },
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPerformance {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
}

/// Companion `model_info.json` written next to a trained tagger. Advisory only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    pub version: Option<String>,
    pub created_at: Option<String>,
    pub labels: Vec<String>,
    pub performance: Option<ModelPerformance>,
    pub description: Option<String>,
}

/// What the registry knows about one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub location: PathBuf,
    pub kind: ModelKind,
    pub available: bool,
    /// Loader that accepted the location, when available.
    pub backend: Option<String>,
    pub size_bytes: u64,
    pub info: Option<ModelInfo>,
}

impl ModelDescriptor {
    pub fn size_mb(&self) -> f64 {
        (self.size_bytes as f64 / (1024.0 * 1024.0) * 10.0).round() / 10.0
    }
}
