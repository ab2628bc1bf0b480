/// Error taxonomy for the image pipeline
///
/// Every failure is scoped to the request that triggered it. Nothing here is
/// process-fatal and nothing is retried automatically.
use std::path::PathBuf;

use thiserror::Error;

/// One or more missing or malformed form fields, in fixed field order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Failures resolving an identifier to pixel data
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("image {id} could not be decoded: {reason}")]
    Decode { id: String, reason: String },

    #[error("failed to read corpus at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("classification failed: {0}")]
    Failure(String),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid artifact name: {0}")]
    InvalidName(String),

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("artifact storage failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode artifact: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("corpus directory does not exist: {0}")]
    MissingCorpus(PathBuf),

    #[error("at least one model identifier must be configured")]
    NoModels,

    #[error("artifact directory {artifact_dir} overlaps corpus directory {corpus_dir}")]
    ArtifactDirOverlapsCorpus {
        artifact_dir: PathBuf,
        corpus_dir: PathBuf,
    },
}

/// Umbrella error returned by the request-level operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("worker task failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Worker(err.to_string())
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
