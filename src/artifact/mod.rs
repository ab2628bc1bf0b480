/// Generated artifacts
///
/// - Collision-free naming and name validation (namer.rs)
/// - Private storage, scoped handles and deletion (store.rs)

pub mod namer;
pub mod store;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use store::{ArtifactGuard, ArtifactStore, ServedArtifact};

/// What an artifact holds; decides its name prefix and serving policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    TransformedImage,
    ReportJson,
    ReportChart,
    Upload,
}

impl ArtifactKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::TransformedImage => "transformed",
            ArtifactKind::ReportJson => "classification_results",
            ArtifactKind::ReportChart => "classification_plot",
            ArtifactKind::Upload => "upload",
        }
    }

    /// Kind of a stored artifact, recovered from its name prefix
    pub fn from_name(name: &str) -> Option<Self> {
        [
            ArtifactKind::TransformedImage,
            ArtifactKind::ReportJson,
            ArtifactKind::ReportChart,
            ArtifactKind::Upload,
        ]
        .into_iter()
        .find(|kind| {
            name.strip_prefix(kind.prefix())
                .map(|rest| rest.starts_with('_'))
                .unwrap_or(false)
        })
    }

    /// Reports are deleted after their first download. Transformed images
    /// stay until explicitly deleted.
    pub fn serve_once(self) -> bool {
        matches!(self, ArtifactKind::ReportJson | ArtifactKind::ReportChart)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    Pending,
    Written,
    Served,
    Deleted,
}

/// Reference handed to the response layer. Carries no storage path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactRef {
    pub name: String,
    pub kind: ArtifactKind,
    pub media_type: String,
    pub created_at: DateTime<Utc>,
}
