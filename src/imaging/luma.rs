/// Luma conversion
///
/// ITU-R 601-2 weights, the same transform used when converting an RGB
/// image to single-channel grayscale.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Luma of one RGB triple, no clamping
#[inline]
pub fn luma(rgb: &[f32]) -> f32 {
    rgb[0] * LUMA_WEIGHTS[0] + rgb[1] * LUMA_WEIGHTS[1] + rgb[2] * LUMA_WEIGHTS[2]
}
