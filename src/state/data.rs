/// Shared data structures for the pipeline
///
/// These structs represent the data model that flows between
/// the corpus, the imaging engines and the report layer.
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

/// A decoded corpus image
///
/// Only built from an identifier that decoded successfully; a decode
/// failure never yields a partial `ImageRef`.
#[derive(Debug, Clone)]
pub struct ImageRef {
    /// Filename only (e.g., "cat.JPEG")
    pub id: String,
    /// Decoded pixel data
    pub pixels: DynamicImage,
    /// Container format the bytes were stored in
    pub format: ImageFormat,
}

impl ImageRef {
    /// Media type of the source encoding
    pub fn media_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// One (label, confidence) entry, confidence on a 0-100 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub label: String,
    pub confidence: f32,
}

impl Score {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Ranked classification output, highest confidence first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    scores: Vec<Score>,
}

impl ClassificationResult {
    /// Rank arbitrary scores descending by confidence
    pub fn ranked(mut scores: Vec<Score>) -> Self {
        scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Self { scores }
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    pub fn top(&self) -> Option<&Score> {
        self.scores.first()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
