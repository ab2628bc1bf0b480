/// Classification backends
///
/// A model is anything implementing `Classifier`. Backends are looked up
/// by model identifier in a `ModelRegistry` built once at start-up.

pub mod palette;

use std::collections::HashMap;
use std::sync::Arc;

use image::DynamicImage;

use crate::config::Config;
use crate::error::ClassificationError;
use crate::state::data::Score;

/// Capability every model backend provides.
///
/// Implementations may be slow but must be deterministic: the same image
/// yields the same scores. Confidences are on a 0-100 scale; ranking is
/// done by the caller.
pub trait Classifier: Send + Sync {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Score>, ClassificationError>;
}

/// Lookup table from model identifier to backend
#[derive(Clone, Default)]
pub struct ModelRegistry {
    backends: HashMap<String, Arc<dyn Classifier>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in backend named in the config
    pub fn with_builtin(config: &Config) -> Self {
        let mut registry = Self::new();
        if config.is_known_model(palette::MODEL_ID) {
            registry.register(palette::MODEL_ID, Arc::new(palette::PaletteClassifier::default()));
        }
        registry
    }

    pub fn register(&mut self, model_id: impl Into<String>, backend: Arc<dyn Classifier>) {
        self.backends.insert(model_id.into(), backend);
    }

    /// Backend for a recognized model. A configured model with no backend
    /// is a classification failure, not an unknown model.
    pub fn backend(&self, model_id: &str) -> Result<Arc<dyn Classifier>, ClassificationError> {
        self.backends.get(model_id).cloned().ok_or_else(|| {
            ClassificationError::Failure(format!("no backend registered for model {}", model_id))
        })
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.backends.contains_key(model_id)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.backends.keys().collect();
        ids.sort();
        f.debug_struct("ModelRegistry").field("models", &ids).finish()
    }
}
