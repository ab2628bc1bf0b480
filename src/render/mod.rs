/// Raster rendering of plots and charts
///
/// Pure pixel drawing on `image::RgbImage`, no plotting dependency:
/// - Drawing primitives and PNG encoding (canvas.rs)
/// - Built-in 5x7 bitmap glyphs for labels (glyphs.rs)
/// - Overlaid channel histograms (histogram.rs)
/// - Horizontal confidence bar charts (chart.rs)

pub mod canvas;
pub mod chart;
pub mod glyphs;
pub mod histogram;
