/// Pixel-value distributions
///
/// Single-channel images get one grayscale distribution. Multi-channel
/// images get one independent 256-bin distribution per color channel;
/// alpha is ignored.
use image::DynamicImage;
use serde::Serialize;

pub const BINS: usize = 256;

/// Which distribution a channel represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    Grayscale,
    Red,
    Green,
    Blue,
}

impl Channel {
    pub fn label(self) -> &'static str {
        match self {
            Channel::Grayscale => "Grayscale",
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelHistogram {
    pub channel: Channel,
    /// Frequency of each value 0..=255
    pub bins: Vec<u32>,
}

impl ChannelHistogram {
    fn empty(channel: Channel) -> Self {
        Self {
            channel,
            bins: vec![0; BINS],
        }
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&c| c as u64).sum()
    }

    pub fn max(&self) -> u32 {
        self.bins.iter().copied().max().unwrap_or(0)
    }
}

/// Count values per channel
pub fn compute(image: &DynamicImage) -> Vec<ChannelHistogram> {
    if image.color().channel_count() <= 2 {
        let mut gray = ChannelHistogram::empty(Channel::Grayscale);
        for &v in image.to_luma8().as_raw() {
            gray.bins[v as usize] += 1;
        }
        return vec![gray];
    }

    let mut channels = [Channel::Red, Channel::Green, Channel::Blue].map(ChannelHistogram::empty);
    for px in image.to_rgb8().pixels() {
        for (hist, &v) in channels.iter_mut().zip(px.0.iter()) {
            hist.bins[v as usize] += 1;
        }
    }
    channels.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_grayscale_known_distribution() {
        let img = GrayImage::from_raw(2, 2, vec![0, 128, 255, 255]).unwrap();
        let hist = compute(&DynamicImage::ImageLuma8(img));

        assert_eq!(hist.len(), 1);
        let gray = &hist[0];
        assert_eq!(gray.channel, Channel::Grayscale);
        assert_eq!(gray.total(), 4);
        assert_eq!(gray.bins.iter().filter(|&&c| c == 2).count(), 1);
        assert_eq!(gray.bins.iter().filter(|&&c| c == 1).count(), 2);
        assert_eq!(gray.bins[255], 2);
        assert_eq!(gray.bins[0], 1);
        assert_eq!(gray.bins[128], 1);
    }

    #[test]
    fn test_rgb_channels_independent() {
        let img = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([10, 20, 30]) } else { Rgb([10, 0, 0]) });
        let hist = compute(&DynamicImage::ImageRgb8(img));

        let labels: Vec<_> = hist.iter().map(|h| h.channel.label()).collect();
        assert_eq!(labels, vec!["Red", "Green", "Blue"]);
        assert_eq!(hist[0].bins[10], 2);
        assert_eq!(hist[1].bins[20], 1);
        assert_eq!(hist[1].bins[0], 1);
        assert_eq!(hist[2].bins[30], 1);
        assert!(hist.iter().all(|h| h.total() == 2));
    }

    #[test]
    fn test_alpha_is_ignored() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 0]));
        let hist = compute(&DynamicImage::ImageRgba8(img));
        assert_eq!(hist.len(), 3);
        assert_eq!(hist[2].bins[3], 1);
    }
}
