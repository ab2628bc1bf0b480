use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use super::glyphs::{glyph, ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::error::ArtifactError;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const AXIS_GRAY: Rgb<u8> = Rgb([90, 90, 90]);

/// Named colors used by plots and charts
pub fn named_color(name: &str) -> Rgb<u8> {
    match name {
        "red" => Rgb([214, 39, 40]),
        "green" => Rgb([44, 160, 44]),
        "blue" => Rgb([31, 119, 180]),
        "orange" => Rgb([255, 127, 14]),
        "purple" => Rgb([148, 103, 189]),
        "gray" => Rgb([127, 127, 127]),
        _ => BLACK,
    }
}

/// A drawable RGB surface. All drawing clips silently at the edges.
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Solid rectangle
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>) {
        self.blend_rect(x, y, w, h, color, 1.0);
    }

    /// Rectangle alpha-blended over what is already drawn
    pub fn blend_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>, alpha: f32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w as i64).min(self.width() as i64);
        let y1 = (y + h as i64).min(self.height() as i64);

        for py in y0..y1 {
            for px in x0..x1 {
                let dst = self.image.get_pixel_mut(px as u32, py as u32);
                *dst = mix(*dst, color, alpha);
            }
        }
    }

    pub fn hline(&mut self, x: i64, y: i64, len: u32, color: Rgb<u8>) {
        self.fill_rect(x, y, len, 1, color);
    }

    pub fn vline(&mut self, x: i64, y: i64, len: u32, color: Rgb<u8>) {
        self.fill_rect(x, y, 1, len, color);
    }

    /// Draw text with its top-left corner at (x, y)
    pub fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let mut cursor = x;
        for c in text.chars() {
            let rows = glyph(c);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            cursor + (col * scale) as i64,
                            y + (row as u32 * scale) as i64,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
            cursor += (ADVANCE * scale) as i64;
        }
    }

    /// Height of one text line at `scale`
    pub fn line_height(scale: u32) -> u32 {
        GLYPH_HEIGHT * scale
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Encode as PNG bytes
    pub fn encode_png(&self) -> Result<Vec<u8>, ArtifactError> {
        encode(&DynamicImage::ImageRgb8(self.image.clone()), ImageFormat::Png)
    }
}

/// Encode any image into `format`
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ArtifactError> {
    let mut cursor = Cursor::new(Vec::new());
    // The JPEG encoder rejects alpha channels
    let result = if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, format)
    } else {
        image.write_to(&mut cursor, format)
    };
    result.map_err(|e| ArtifactError::Encode(format!("{:?} encoding failed: {}", format, e)))?;
    Ok(cursor.into_inner())
}

#[inline]
fn mix(dst: Rgb<u8>, src: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let a = alpha.clamp(0.0, 1.0);
    let channel = |d: u8, s: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
    Rgb([
        channel(dst[0], src[0]),
        channel(dst[1], src[1]),
        channel(dst[2], src[2]),
    ])
}
