/// Report generation
///
/// Turns a ranked classification into the two downloadable artifacts:
/// a pretty-printed JSON document and a horizontal bar chart PNG.
/// Both are pure functions of their inputs.
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::render::chart;
use crate::state::data::{ClassificationResult, Score};

/// JSON report layout. Field names are part of the download contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub image_id: String,
    pub classification_scores: Vec<Score>,
}

pub fn to_json(image_id: &str, result: &ClassificationResult) -> Result<Vec<u8>, ArtifactError> {
    let report = ClassificationReport {
        image_id: image_id.to_string(),
        classification_scores: result.scores().to_vec(),
    };
    serde_json::to_vec_pretty(&report).map_err(|e| ArtifactError::Encode(e.to_string()))
}

pub fn to_chart(image_id: &str, result: &ClassificationResult) -> Result<Vec<u8>, ArtifactError> {
    chart::render_png(image_id, result.scores())
}
