/// Unclamped floating-point working buffer
///
/// Enhancement stages run on `f32` samples in the 0-255 range without
/// clamping between stages. Values are rounded and clamped to the channel
/// range only when converting back to an 8-bit image.
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

#[derive(Debug, Clone, PartialEq)]
pub struct Planes {
    pub width: u32,
    pub height: u32,
    /// 1 for grayscale, 3 for RGB
    pub channels: usize,
    /// Interleaved color samples, `width * height * channels` long
    pub data: Vec<f32>,
    /// Alpha carried through untouched, if the source had one
    pub alpha: Option<Vec<u8>>,
}

impl Planes {
    pub fn from_image(image: &DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let gray = image.color().channel_count() <= 2;
        let has_alpha = image.color().has_alpha();

        let (channels, data, alpha) = match (gray, has_alpha) {
            (true, false) => (1, samples(image.to_luma8().as_raw()), None),
            (true, true) => {
                let (color, alpha) = split_alpha(image.to_luma_alpha8().as_raw(), 1);
                (1, color, Some(alpha))
            }
            (false, false) => (3, samples(image.to_rgb8().as_raw()), None),
            (false, true) => {
                let (color, alpha) = split_alpha(image.to_rgba8().as_raw(), 3);
                (3, color, Some(alpha))
            }
        };

        Self {
            width,
            height,
            channels,
            data,
            alpha,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Round, clamp and pack back into an 8-bit image
    pub fn into_image(self) -> DynamicImage {
        let Planes {
            width,
            height,
            channels,
            data,
            alpha,
        } = self;

        let color: Vec<u8> = data.iter().map(|&v| to_u8(v)).collect();
        let has_alpha = alpha.is_some();

        let packed = match alpha {
            None => color,
            Some(alpha) => color
                .chunks(channels)
                .zip(alpha)
                .flat_map(|(px, a)| px.iter().copied().chain(std::iter::once(a)))
                .collect(),
        };

        // Buffer lengths match width * height * stride by construction
        match (channels, has_alpha) {
            (1, false) => GrayImage::from_raw(width, height, packed).map(DynamicImage::ImageLuma8),
            (1, true) => {
                GrayAlphaImage::from_raw(width, height, packed).map(DynamicImage::ImageLumaA8)
            }
            (_, false) => RgbImage::from_raw(width, height, packed).map(DynamicImage::ImageRgb8),
            (_, true) => RgbaImage::from_raw(width, height, packed).map(DynamicImage::ImageRgba8),
        }
        .unwrap_or_else(|| DynamicImage::new_rgb8(width, height))
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

fn samples(raw: &[u8]) -> Vec<f32> {
    raw.iter().map(|&v| v as f32).collect()
}

fn split_alpha(raw: &[u8], color_channels: usize) -> (Vec<f32>, Vec<u8>) {
    let stride = color_channels + 1;
    let mut color = Vec::with_capacity(raw.len() / stride * color_channels);
    let mut alpha = Vec::with_capacity(raw.len() / stride);
    for px in raw.chunks_exact(stride) {
        color.extend(px[..color_channels].iter().map(|&v| v as f32));
        alpha.push(px[color_channels]);
    }
    (color, alpha)
}
