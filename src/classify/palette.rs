/// Built-in color-family classifier
///
/// Labels an image by the share of pixels nearest to each named color
/// family. Deterministic and dependency-free, so the pipeline works
/// without an external model.
use image::imageops::FilterType;
use image::DynamicImage;

use super::Classifier;
use crate::error::ClassificationError;
use crate::state::data::Score;

pub const MODEL_ID: &str = "palette";

/// Images are reduced to at most this many pixels per side before counting
const SAMPLE_SIZE: u32 = 64;

const FAMILIES: [(&str, [u8; 3]); 12] = [
    ("red", [200, 30, 30]),
    ("orange", [240, 140, 20]),
    ("yellow", [235, 220, 40]),
    ("green", [40, 160, 60]),
    ("cyan", [40, 200, 210]),
    ("blue", [30, 70, 200]),
    ("purple", [130, 50, 170]),
    ("pink", [240, 150, 190]),
    ("brown", [120, 75, 40]),
    ("black", [15, 15, 15]),
    ("white", [240, 240, 240]),
    ("gray", [128, 128, 128]),
];

#[derive(Debug, Clone)]
pub struct PaletteClassifier {
    /// Number of families returned
    pub top_k: usize,
}

impl Default for PaletteClassifier {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl Classifier for PaletteClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Score>, ClassificationError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassificationError::Failure("image has no pixels".to_string()));
        }

        let sample = if image.width() > SAMPLE_SIZE || image.height() > SAMPLE_SIZE {
            image.resize(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle)
        } else {
            image.clone()
        };
        let rgb = sample.to_rgb8();

        let mut counts = [0u32; FAMILIES.len()];
        for px in rgb.pixels() {
            counts[nearest_family(px.0)] += 1;
        }

        let total = rgb.pixels().len() as f32;
        let mut scores: Vec<Score> = FAMILIES
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|((label, _), count)| Score::new(*label, count as f32 / total * 100.0))
            .collect();

        scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        scores.truncate(self.top_k);
        Ok(scores)
    }
}

fn nearest_family(px: [u8; 3]) -> usize {
    let distance = |reference: &[u8; 3]| -> u32 {
        px.iter()
            .zip(reference)
            .map(|(&a, &b)| (a as i32 - b as i32).pow(2) as u32)
            .sum()
    };

    FAMILIES
        .iter()
        .enumerate()
        .min_by_key(|(_, (_, reference))| distance(reference))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_dominant_color_ranks_first() {
        let img = RgbImage::from_fn(10, 10, |x, _| {
            if x < 7 {
                Rgb([25, 60, 210])
            } else {
                Rgb([245, 245, 245])
            }
        });

        let scores = PaletteClassifier::default()
            .classify(&DynamicImage::ImageRgb8(img))
            .unwrap();

        assert_eq!(scores[0].label, "blue");
        assert!((scores[0].confidence - 70.0).abs() < 1e-3);
        assert_eq!(scores[1].label, "white");
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn test_deterministic() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(80, 50, |x, y| {
            Rgb([(x * 3) as u8, (y * 5) as u8, 90])
        }));
        let classifier = PaletteClassifier::default();
        assert_eq!(classifier.classify(&img).unwrap(), classifier.classify(&img).unwrap());
    }

    #[test]
    fn test_empty_image_fails() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            PaletteClassifier::default().classify(&img),
            Err(ClassificationError::Failure(_))
        ));
    }
}
