/// Histogram plot
///
/// Overlays one translucent distribution per channel on a shared
/// frequency axis, with a legend naming each channel.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::Rgb;

use super::canvas::{named_color, Canvas, AXIS_GRAY, BLACK, WHITE};
use super::glyphs::text_width;
use crate::error::ArtifactError;
use crate::imaging::histogram::{Channel, ChannelHistogram, BINS};

const WIDTH: u32 = 600;
const HEIGHT: u32 = 400;
const LEFT: u32 = 64;
const TOP: u32 = 24;
/// Two pixels per bin
const PLOT_W: u32 = 512;
const PLOT_H: u32 = 312;

fn channel_style(channel: Channel) -> (Rgb<u8>, f32) {
    match channel {
        Channel::Grayscale => (named_color("gray"), 0.7),
        Channel::Red => (named_color("red"), 0.5),
        Channel::Green => (named_color("green"), 0.5),
        Channel::Blue => (named_color("blue"), 0.5),
    }
}

/// Draw the distributions and return the plot as PNG bytes
pub fn render_png(channels: &[ChannelHistogram]) -> Result<Vec<u8>, ArtifactError> {
    let mut canvas = Canvas::new(WIDTH, HEIGHT, WHITE);

    // Find maximum value across all channels for normalization
    let max_value = channels.iter().map(ChannelHistogram::max).max().unwrap_or(0);

    let bar_width = PLOT_W / BINS as u32;
    let baseline = (TOP + PLOT_H) as i64;

    if max_value > 0 {
        for hist in channels {
            let (color, alpha) = channel_style(hist.channel);
            for (i, &count) in hist.bins.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let normalized = count as f32 / max_value as f32;
                let bar_height = ((normalized * PLOT_H as f32).round() as u32).max(1);
                let x = LEFT as i64 + (i as u32 * bar_width) as i64;
                canvas.blend_rect(x, baseline - bar_height as i64, bar_width, bar_height, color, alpha);
            }
        }
    }

    draw_axes(&mut canvas, max_value);
    draw_legend(&mut canvas, channels);

    canvas.encode_png()
}

/// Render and base64-encode, ready to embed in a response
pub fn render_base64(channels: &[ChannelHistogram]) -> Result<String, ArtifactError> {
    Ok(STANDARD.encode(render_png(channels)?))
}

fn draw_axes(canvas: &mut Canvas, max_value: u32) {
    let baseline = (TOP + PLOT_H) as i64;

    canvas.hline(LEFT as i64, baseline, PLOT_W, BLACK);
    canvas.vline(LEFT as i64 - 1, TOP as i64, PLOT_H + 1, BLACK);

    for tick in [0u32, 64, 128, 192, 255] {
        let x = LEFT as i64 + (tick * (PLOT_W / BINS as u32)) as i64;
        canvas.vline(x, baseline + 1, 4, BLACK);
        let label = tick.to_string();
        let half = text_width(&label, 1) as i64 / 2;
        canvas.text(x - half, baseline + 8, &label, 1, AXIS_GRAY);
    }

    let max_label = max_value.to_string();
    let label_x = LEFT as i64 - 6 - text_width(&max_label, 1) as i64;
    canvas.text(label_x, TOP as i64, &max_label, 1, AXIS_GRAY);
    canvas.text(LEFT as i64 - 12, baseline - 7, "0", 1, AXIS_GRAY);

    let x_title = "Pixel Value";
    let x_title_x = LEFT as i64 + (PLOT_W as i64 - text_width(x_title, 2) as i64) / 2;
    canvas.text(x_title_x, baseline + 26, x_title, 2, BLACK);
    canvas.text(4, 4, "Frequency", 2, BLACK);
}

fn draw_legend(canvas: &mut Canvas, channels: &[ChannelHistogram]) {
    let swatch = 10;
    let row_height = 16;
    let widest = channels
        .iter()
        .map(|h| text_width(h.channel.label(), 1))
        .max()
        .unwrap_or(0);
    let x = (LEFT + PLOT_W) as i64 - (widest + swatch + 16) as i64;

    for (row, hist) in channels.iter().enumerate() {
        let (color, alpha) = channel_style(hist.channel);
        let y = TOP as i64 + 6 + row as i64 * row_height;
        canvas.blend_rect(x, y, swatch, swatch, color, alpha);
        canvas.text(x + swatch as i64 + 6, y + 2, hist.channel.label(), 1, BLACK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::histogram::compute;
    use image::{DynamicImage, GrayImage, RgbImage};

    #[test]
    fn test_render_grayscale_plot() {
        let img = GrayImage::from_raw(2, 2, vec![0, 128, 255, 255]).unwrap();
        let hist = compute(&DynamicImage::ImageLuma8(img));

        let png = render_png(&hist).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (WIDTH, HEIGHT));

        // Tallest bin (255) reaches the top of the plot area
        let x = LEFT + 255 * 2;
        let top = decoded.to_rgb8().get_pixel(x, TOP + 1).0;
        assert_ne!(top, [255, 255, 255]);
    }

    #[test]
    fn test_render_base64_decodes() {
        let hist = compute(&DynamicImage::ImageRgb8(RgbImage::new(4, 4)));
        let encoded = render_base64(&hist).unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn test_render_empty_image() {
        let hist = compute(&DynamicImage::ImageLuma8(GrayImage::new(0, 0)));
        assert!(render_png(&hist).is_ok());
    }
}
