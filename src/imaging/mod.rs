/// Pixel-level image processing
///
/// This module handles:
/// - Converting decoded images to an unclamped working buffer (planes.rs)
/// - Luma weights shared by the color and contrast stages (luma.rs)
/// - The four-stage enhancement chain (enhance.rs)
/// - Per-channel value distributions (histogram.rs)

pub mod enhance;
pub mod histogram;
pub mod luma;
pub mod planes;
