use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use super::loaders::{default_loaders, load_first_success, TaggerLoader};
use super::types::{
    ModelDescriptor, ModelInfo, ModelKind, ModelLocation, Tagger, GENERAL_MODEL_ID,
    WELL_KNOWN_LOCATIONS,
};

pub const MODEL_INFO_FILE: &str = "model_info.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryState {
    Uninitialized,
    Scanning,
    Ready,
}

struct Entry {
    descriptor: ModelDescriptor,
    tagger: Option<Arc<dyn Tagger>>,
}

struct Inner {
    state: RegistryState,
    entries: Vec<Entry>,
    active: Option<String>,
    preferred: Option<String>,
}

/// Snapshot for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    pub state: RegistryState,
    pub models_dir: PathBuf,
    pub active_model: Option<String>,
    pub available: usize,
    pub known: usize,
    pub models: Vec<ModelDescriptor>,
}

/// Discovers taggers under the models directory and tracks the active one.
///
/// Shared across requests behind an `Arc`; loading happens once at startup
/// and again on [`ModelRegistry::refresh`].
pub struct ModelRegistry {
    root: PathBuf,
    locations: Vec<ModelLocation>,
    loaders: Vec<Box<dyn TaggerLoader>>,
    inner: RwLock<Inner>,
}

impl ModelRegistry {
    /// Registry over the well-known locations with the default loaders.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_loaders(root, WELL_KNOWN_LOCATIONS.to_vec(), default_loaders())
    }

    pub fn with_loaders(
        root: impl Into<PathBuf>,
        locations: Vec<ModelLocation>,
        loaders: Vec<Box<dyn TaggerLoader>>,
    ) -> Self {
        Self {
            root: root.into(),
            locations,
            loaders,
            inner: RwLock::new(Inner {
                state: RegistryState::Uninitialized,
                entries: Vec::new(),
                active: None,
                preferred: None,
            }),
        }
    }

    /// Scan every location and pick the active tagger.
    ///
    /// `preferred` wins when it loaded; otherwise the selection policy applies.
    pub fn initialize(&self, preferred: Option<&str>) {
        self.write().preferred = preferred.map(str::to_string);
        self.scan(false);
    }

    /// Rescan. The active tagger is kept when it is still available.
    pub fn refresh(&self) {
        self.scan(true);
    }

    fn scan(&self, keep_active: bool) {
        self.write().state = RegistryState::Scanning;
        tracing::info!(models_dir = %self.root.display(), "Scanning model locations");

        let entries: Vec<Entry> = self
            .locations
            .iter()
            .map(|location| self.load_location(location))
            .collect();

        // The selection may have changed while locations were loading.
        let mut inner = self.write();
        let current = if keep_active { inner.active.clone() } else { None };
        let preferred = inner.preferred.clone();
        let active = [current, preferred]
            .into_iter()
            .flatten()
            .find(|id| is_available(&entries, id))
            .or_else(|| select_default(&entries));

        let available = entries.iter().filter(|e| e.tagger.is_some()).count();
        match &active {
            Some(id) => tracing::info!(active = %id, available, "Model registry ready"),
            None => tracing::warn!("No entity tagger available, pattern extraction only"),
        }

        inner.entries = entries;
        inner.active = active;
        inner.state = RegistryState::Ready;
    }

    fn load_location(&self, location: &ModelLocation) -> Entry {
        let path = self.root.join(location.dir_name);
        let mut descriptor = ModelDescriptor {
            id: location.id.to_string(),
            display_name: location.display_name.to_string(),
            description: location.description.to_string(),
            location: path.clone(),
            kind: location.kind,
            available: false,
            backend: None,
            size_bytes: 0,
            info: None,
        };

        if !path.is_dir() {
            tracing::debug!(model = location.id, path = %path.display(), "Model location absent");
            return Entry {
                descriptor,
                tagger: None,
            };
        }

        descriptor.size_bytes = directory_size(&path);
        descriptor.info = read_model_info(&path);

        match load_first_success(&self.loaders, &path) {
            Ok((tagger, backend)) => {
                tracing::info!(model = location.id, backend, "Model loaded");
                descriptor.available = true;
                descriptor.backend = Some(backend.to_string());
                Entry {
                    descriptor,
                    tagger: Some(tagger),
                }
            }
            Err(e) => {
                tracing::warn!(model = location.id, error = %e, "Model failed to load, omitted");
                Entry {
                    descriptor,
                    tagger: None,
                }
            }
        }
    }

    pub fn state(&self) -> RegistryState {
        self.read().state
    }

    pub fn models_dir(&self) -> &Path {
        &self.root
    }

    /// Loaded taggers only.
    pub fn list_available(&self) -> Vec<ModelDescriptor> {
        self.read()
            .entries
            .iter()
            .filter(|e| e.tagger.is_some())
            .map(|e| e.descriptor.clone())
            .collect()
    }

    /// Every scanned location, with its availability flag.
    pub fn list_known(&self) -> Vec<ModelDescriptor> {
        self.read()
            .entries
            .iter()
            .map(|e| e.descriptor.clone())
            .collect()
    }

    /// Switch the active tagger. Unknown or unavailable ids leave the
    /// current selection untouched and return false.
    pub fn set_active(&self, id: &str) -> bool {
        let mut inner = self.write();
        if !is_available(&inner.entries, id) {
            tracing::warn!(model = id, "Cannot activate unavailable model");
            return false;
        }
        tracing::info!(model = id, "Active model changed");
        inner.active = Some(id.to_string());
        true
    }

    pub fn active_id(&self) -> Option<String> {
        self.read().active.clone()
    }

    pub fn get_active(&self) -> Option<Arc<dyn Tagger>> {
        self.active().map(|(_, tagger)| tagger)
    }

    /// Active id and tagger, read together.
    pub fn active(&self) -> Option<(String, Arc<dyn Tagger>)> {
        let inner = self.read();
        let id = inner.active.as_deref()?;
        find_tagger(&inner.entries, id).map(|tagger| (id.to_string(), tagger))
    }

    /// A specific loaded tagger, without changing the active one.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Tagger>> {
        find_tagger(&self.read().entries, id)
    }

    pub fn status(&self) -> RegistryStatus {
        let inner = self.read();
        RegistryStatus {
            state: inner.state,
            models_dir: self.root.clone(),
            active_model: inner.active.clone(),
            available: inner.entries.iter().filter(|e| e.tagger.is_some()).count(),
            known: inner.entries.len(),
            models: inner.entries.iter().map(|e| e.descriptor.clone()).collect(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_available(entries: &[Entry], id: &str) -> bool {
    entries
        .iter()
        .any(|e| e.descriptor.id == id && e.tagger.is_some())
}

fn find_tagger(entries: &[Entry], id: &str) -> Option<Arc<dyn Tagger>> {
    entries
        .iter()
        .find(|e| e.descriptor.id == id)
        .and_then(|e| e.tagger.clone())
}

/// General trained tagger first, then the stock default, else none.
fn select_default(entries: &[Entry]) -> Option<String> {
    let loaded = || entries.iter().filter(|e| e.tagger.is_some());
    loaded()
        .find(|e| e.descriptor.id == GENERAL_MODEL_ID)
        .or_else(|| loaded().find(|e| e.descriptor.kind == ModelKind::Default))
        .map(|e| e.descriptor.id.clone())
}

/// Advisory metadata; any problem reading it yields `None`.
pub fn read_model_info(location: &Path) -> Option<ModelInfo> {
    let path = location.join(MODEL_INFO_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable model info");
            None
        }
    }
}

/// Total size of regular files under `path`.
pub fn directory_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(ft) if ft.is_dir() => directory_size(&entry.path()),
            Ok(ft) if ft.is_file() => entry.metadata().map(|m| m.len()).unwrap_or(0),
            _ => 0,
        })
        .sum()
}
