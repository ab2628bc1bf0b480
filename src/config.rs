/// Process-wide configuration
///
/// Built once at start-up and shared by `Arc`. No component mutates it.
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming the corpus directory
pub const ENV_CORPUS_DIR: &str = "IMAGE_PIPELINE_CORPUS_DIR";
/// Environment variable naming the artifact directory
pub const ENV_ARTIFACT_DIR: &str = "IMAGE_PIPELINE_ARTIFACT_DIR";
/// Environment variable holding a comma separated model list
pub const ENV_MODELS: &str = "IMAGE_PIPELINE_MODELS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Read-only directory of source images
    pub corpus_dir: PathBuf,
    /// Private writable area for generated artifacts.
    /// `None` means a temporary directory owned by the artifact store.
    pub artifact_dir: Option<PathBuf>,
    /// Recognized model identifiers, in display order
    pub models: Vec<String>,
    /// File extensions that count as corpus images
    pub image_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_dir: Self::default_corpus_dir(),
            artifact_dir: None,
            models: vec![crate::classify::palette::MODEL_ID.to_string()],
            image_extensions: ["JPEG", "jpeg", "jpg", "JPG", "png", "PNG"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Config rooted at a corpus directory, everything else defaulted
    pub fn with_corpus(corpus_dir: impl Into<PathBuf>) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            ..Self::default()
        }
    }

    /// Default corpus location:
    /// - Linux: ~/.local/share/image-pipeline/corpus
    /// - macOS: ~/Library/Application Support/image-pipeline/corpus
    fn default_corpus_dir() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        path.push("image-pipeline");
        path.push("corpus");
        path
    }

    /// Persistent artifact location used by the command line tool:
    /// - Linux: ~/.cache/image-pipeline/artifacts
    /// - macOS: ~/Library/Caches/image-pipeline/artifacts
    pub fn default_artifact_dir() -> PathBuf {
        let mut path = dirs::cache_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        path.push("image-pipeline");
        path.push("artifacts");
        path
    }

    /// Fill in the persistent artifact location when none is configured.
    /// Artifacts then outlive the process until `delete_artifact`.
    pub fn with_persistent_artifacts(mut self) -> Self {
        if self.artifact_dir.is_none() {
            self.artifact_dir = Some(Self::default_artifact_dir());
        }
        self
    }

    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Overlay environment variables on top of `self`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(ENV_CORPUS_DIR) {
            self.corpus_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var(ENV_ARTIFACT_DIR) {
            self.artifact_dir = Some(PathBuf::from(dir));
        }
        if let Ok(models) = std::env::var(ENV_MODELS) {
            self.models = parse_model_list(&models);
        }
        self
    }

    /// Resolve config: explicit file first, then environment, then defaults
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match file {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        if !self.corpus_dir.is_dir() {
            return Err(ConfigError::MissingCorpus(self.corpus_dir.clone()));
        }
        self.check_artifact_area()
    }

    /// The artifact area must be disjoint from the corpus: equal paths and
    /// nesting in either direction are rejected.
    pub fn check_artifact_area(&self) -> Result<(), ConfigError> {
        let Some(artifact_dir) = &self.artifact_dir else {
            return Ok(());
        };

        let corpus = resolve_path(&self.corpus_dir);
        let artifacts = resolve_path(artifact_dir);
        if artifacts.starts_with(&corpus) || corpus.starts_with(&artifacts) {
            return Err(ConfigError::ArtifactDirOverlapsCorpus {
                artifact_dir: artifact_dir.clone(),
                corpus_dir: self.corpus_dir.clone(),
            });
        }
        Ok(())
    }

    pub fn is_known_model(&self, model_id: &str) -> bool {
        self.models.iter().any(|m| m == model_id)
    }

    /// Whether a file name carries one of the recognized extensions
    pub fn has_image_extension(&self, file_name: &str) -> bool {
        match Path::new(file_name).extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy();
                self.image_extensions.iter().any(|known| *known == ext)
            }
            None => false,
        }
    }
}

/// Absolute, symlink-free form of a path that may not exist yet.
/// `.` and `..` are folded lexically, then the longest existing ancestor
/// is canonicalized and the missing tail appended.
fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    let mut existing = normalized.as_path();
    let mut missing = Vec::new();
    let mut resolved = loop {
        if let Ok(real) = existing.canonicalize() {
            break real;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break existing.to_path_buf(),
        }
    };

    for name in missing.into_iter().rev() {
        resolved.push(name);
    }
    resolved
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
