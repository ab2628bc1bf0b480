/// Enhancement parameters and the form validator that produces them
///
/// Raw form values arrive as text. Validation is all-or-nothing for the
/// request, but every invalid field is reported in one pass, in the fixed
/// order image id, color, brightness, contrast, sharpness.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

/// Field names as submitted by the form layer
pub const FIELD_IMAGE_ID: &str = "image_id";
pub const FIELD_COLOR: &str = "color";
pub const FIELD_BRIGHTNESS: &str = "brightness";
pub const FIELD_CONTRAST: &str = "contrast";
pub const FIELD_SHARPNESS: &str = "sharpness";

/// The four enhancement factors
///
/// Each factor is a 1.0-centered multiplicative scale:
/// - 1.0 = no adjustment
/// - 0.0 = attribute driven to its minimum (gray, black, flat, blurred)
/// - above 1.0 amplifies
///
/// Negative and very large values are accepted as-is.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TransformParams {
    // ========== Color ==========
    /// Saturation factor (0.0 = grayscale)
    pub color: f32,

    // ========== Tone ==========
    /// Brightness factor (0.0 = black)
    pub brightness: f32,
    /// Contrast factor (0.0 = uniform gray at the image mean)
    pub contrast: f32,

    // ========== Detail ==========
    /// Sharpness factor (0.0 = smoothed, 2.0 = sharpened)
    pub sharpness: f32,
}

impl Default for TransformParams {
    /// Identity parameters (no adjustments)
    fn default() -> Self {
        Self {
            color: 1.0,
            brightness: 1.0,
            contrast: 1.0,
            sharpness: 1.0,
        }
    }
}

impl TransformParams {
    pub fn new(color: f32, brightness: f32, contrast: f32, sharpness: f32) -> Self {
        Self {
            color,
            brightness,
            contrast,
            sharpness,
        }
    }

    /// Check if every factor is exactly 1.0
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Raw text fields of a transformation request, exactly as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransformForm {
    pub image_id: Option<String>,
    pub color: Option<String>,
    pub brightness: Option<String>,
    pub contrast: Option<String>,
    pub sharpness: Option<String>,
}

impl RawTransformForm {
    /// Pick the five known fields out of a key/value mapping
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).cloned();
        Self {
            image_id: get(FIELD_IMAGE_ID),
            color: get(FIELD_COLOR),
            brightness: get(FIELD_BRIGHTNESS),
            contrast: get(FIELD_CONTRAST),
            sharpness: get(FIELD_SHARPNESS),
        }
    }

    /// Validate every field and build the request, or list every problem
    pub fn validate(&self) -> Result<(String, TransformParams), ValidationErrors> {
        let mut errors = Vec::new();

        let image_id = match self.image_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(id.to_string()),
            _ => {
                errors.push("A valid image id is required".to_string());
                None
            }
        };

        let mut factor = |raw: &Option<String>, name: &str| {
            let parsed = parse_factor(raw.as_deref());
            if parsed.is_none() {
                errors.push(format!("A valid {} value is required", name));
            }
            parsed
        };

        let color = factor(&self.color, FIELD_COLOR);
        let brightness = factor(&self.brightness, FIELD_BRIGHTNESS);
        let contrast = factor(&self.contrast, FIELD_CONTRAST);
        let sharpness = factor(&self.sharpness, FIELD_SHARPNESS);

        match (image_id, color, brightness, contrast, sharpness) {
            (Some(id), Some(c), Some(b), Some(ct), Some(s)) => {
                Ok((id, TransformParams::new(c, b, ct, s)))
            }
            _ => Err(ValidationErrors(errors)),
        }
    }
}

/// Numeric text to a finite factor; empty, absent or non-numeric is `None`
fn parse_factor(raw: Option<&str>) -> Option<f32> {
    let value: f32 = raw?.trim().parse().ok()?;
    value.is_finite().then_some(value)
}
