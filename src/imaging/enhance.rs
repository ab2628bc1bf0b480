/// The enhancement chain
///
/// Four multiplicative adjustments applied in a fixed order:
/// color saturation, brightness, contrast, sharpness.
///
/// Each stage blends the current buffer with a "degenerate" version of it:
///
///   out = current * factor + degenerate * (1 - factor)
///
/// | Stage      | Degenerate image                              |
/// |------------|-----------------------------------------------|
/// | Color      | grayscale (luma) of the current buffer        |
/// | Brightness | black                                         |
/// | Contrast   | uniform gray at the rounded mean luma         |
/// | Sharpness  | 3x3 smoothed buffer, borders left untouched   |
///
/// Every stage consumes the previous stage's output. Nothing is clamped
/// until the final 8-bit encode.
use image::DynamicImage;

use super::luma::luma;
use super::planes::Planes;
use crate::state::params::TransformParams;

/// Stages in the order they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Color,
    Brightness,
    Contrast,
    Sharpness,
}

pub const CHAIN: [Stage; 4] = [
    Stage::Color,
    Stage::Brightness,
    Stage::Contrast,
    Stage::Sharpness,
];

/// 3x3 smoothing kernel used as the sharpness baseline (weights sum to 13)
const SMOOTH_KERNEL: [[f32; 3]; 3] = [[1.0, 1.0, 1.0], [1.0, 5.0, 1.0], [1.0, 1.0, 1.0]];
const SMOOTH_SCALE: f32 = 13.0;

impl Stage {
    fn factor(self, params: &TransformParams) -> f32 {
        match self {
            Stage::Color => params.color,
            Stage::Brightness => params.brightness,
            Stage::Contrast => params.contrast,
            Stage::Sharpness => params.sharpness,
        }
    }

    fn apply(self, planes: &mut Planes, factor: f32) {
        match self {
            Stage::Color => apply_color(planes, factor),
            Stage::Brightness => apply_brightness(planes, factor),
            Stage::Contrast => apply_contrast(planes, factor),
            Stage::Sharpness => apply_sharpness(planes, factor),
        }
    }
}

/// Apply the full chain. The input image is never modified.
pub fn enhance(image: &DynamicImage, params: &TransformParams) -> DynamicImage {
    let mut planes = Planes::from_image(image);

    for stage in CHAIN {
        stage.apply(&mut planes, stage.factor(params));
    }

    planes.into_image()
}

#[inline]
fn blend(current: f32, degenerate: f32, factor: f32) -> f32 {
    current * factor + degenerate * (1.0 - factor)
}

fn apply_color(planes: &mut Planes, factor: f32) {
    // Grayscale is its own degenerate image
    if planes.channels < 3 {
        return;
    }
    for px in planes.data.chunks_exact_mut(3) {
        let gray = luma(px);
        for v in px.iter_mut() {
            *v = blend(*v, gray, factor);
        }
    }
}

fn apply_brightness(planes: &mut Planes, factor: f32) {
    for v in planes.data.iter_mut() {
        *v = blend(*v, 0.0, factor);
    }
}

fn apply_contrast(planes: &mut Planes, factor: f32) {
    let mean = mean_luma(planes);
    for v in planes.data.iter_mut() {
        *v = blend(*v, mean, factor);
    }
}

fn apply_sharpness(planes: &mut Planes, factor: f32) {
    let smoothed = smooth(planes);
    for (v, s) in planes.data.iter_mut().zip(smoothed) {
        *v = blend(*v, s, factor);
    }
}

/// Mean luma rounded half-up to a whole gray level
fn mean_luma(planes: &Planes) -> f32 {
    let count = planes.pixel_count();
    if count == 0 {
        return 0.0;
    }

    let sum: f64 = if planes.channels >= 3 {
        planes
            .data
            .chunks_exact(planes.channels)
            .map(|px| luma(px) as f64)
            .sum()
    } else {
        planes.data.iter().map(|&v| v as f64).sum()
    };

    (sum / count as f64 + 0.5).floor() as f32
}

/// Smoothed copy of the buffer; edge pixels are copied unchanged
fn smooth(planes: &Planes) -> Vec<f32> {
    let (w, h, c) = (
        planes.width as usize,
        planes.height as usize,
        planes.channels,
    );
    let mut out = planes.data.clone();
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            for ch in 0..c {
                let mut acc = 0.0;
                for (ky, row) in SMOOTH_KERNEL.iter().enumerate() {
                    for (kx, weight) in row.iter().enumerate() {
                        let sx = x + kx - 1;
                        let sy = y + ky - 1;
                        acc += planes.data[(sy * w + sx) * c + ch] * weight;
                    }
                }
                out[(y * w + x) * c + ch] = acc / SMOOTH_SCALE;
            }
        }
    }

    out
}
