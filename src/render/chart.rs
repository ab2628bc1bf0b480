/// Horizontal confidence bar chart
///
/// One bar per score on a fixed 0-100 axis. The ranked list is reversed
/// and drawn bottom-up, so the highest confidence ends up on the top row.
use super::canvas::{named_color, Canvas, AXIS_GRAY, BLACK, WHITE};
use super::glyphs::{text_width, ADVANCE};
use crate::error::ArtifactError;
use crate::state::data::Score;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;
const LEFT: u32 = 220;
const RIGHT: u32 = 40;
const TOP: u32 = 50;
const BOTTOM: u32 = 70;
const PLOT_W: u32 = WIDTH - LEFT - RIGHT;
const PLOT_H: u32 = HEIGHT - TOP - BOTTOM;

/// Confidence axis upper bound
pub const AXIS_MAX: f32 = 100.0;

/// Bar colors, assigned in drawing order (lowest row first)
const PALETTE: [&str; 5] = ["green", "red", "orange", "blue", "purple"];

pub fn render_png(image_id: &str, scores: &[Score]) -> Result<Vec<u8>, ArtifactError> {
    let mut canvas = Canvas::new(WIDTH, HEIGHT, WHITE);

    let title = format!("Classification Results for {}", image_id);
    let title_x = (WIDTH as i64 - text_width(&title, 2) as i64) / 2;
    canvas.text(title_x.max(4), 16, &title, 2, BLACK);

    // Fractional rows: long results still fit the plot, bars just get thin
    let row_h = PLOT_H as f32 / scores.len().max(1) as f32;
    let bar_h = ((row_h * 0.7).round() as u32).max(1);
    let gap = (row_h - bar_h as f32).max(0.0) / 2.0;
    let labelled = row_h >= Canvas::line_height(1) as f32;
    let baseline = (TOP + PLOT_H) as i64;

    for (k, score) in scores.iter().rev().enumerate() {
        let color = named_color(PALETTE[k % PALETTE.len()]);
        let row_top = baseline - ((k + 1) as f32 * row_h).round() as i64;
        let bar_y = row_top + gap.round() as i64;
        canvas.fill_rect(LEFT as i64, bar_y, bar_length(score.confidence), bar_h, color);

        if !labelled {
            continue;
        }
        let label = fit_label(&score.label, LEFT - 16);
        let label_x = LEFT as i64 - 8 - text_width(&label, 1) as i64;
        let text_y = bar_y + (bar_h as i64 - Canvas::line_height(1) as i64) / 2;
        canvas.text(label_x, text_y, &label, 1, BLACK);

        let value = format!("{:.2}", score.confidence);
        let value_x = LEFT as i64 + bar_length(score.confidence) as i64 + 4;
        canvas.text(value_x, text_y, &value, 1, AXIS_GRAY);
    }

    draw_axis(&mut canvas);
    canvas.encode_png()
}

/// Pixel length of a bar, clipped to the axis range
fn bar_length(confidence: f32) -> u32 {
    let clamped = if confidence.is_finite() {
        confidence.clamp(0.0, AXIS_MAX)
    } else {
        0.0
    };
    (clamped / AXIS_MAX * PLOT_W as f32).round() as u32
}

/// Truncate a label to fit `max_width` pixels at scale 1
fn fit_label(label: &str, max_width: u32) -> String {
    let max_chars = (max_width / ADVANCE) as usize;
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(2)).collect();
    format!("{}..", kept)
}

fn draw_axis(canvas: &mut Canvas) {
    let baseline = (TOP + PLOT_H) as i64;
    canvas.hline(LEFT as i64, baseline, PLOT_W + 1, BLACK);
    canvas.vline(LEFT as i64 - 1, TOP as i64, PLOT_H + 1, BLACK);

    for tick in (0..=100).step_by(20) {
        let x = LEFT as i64 + bar_length(tick as f32) as i64;
        canvas.vline(x, baseline + 1, 5, BLACK);
        let label = tick.to_string();
        canvas.text(x - text_width(&label, 1) as i64 / 2, baseline + 10, &label, 1, AXIS_GRAY);
    }

    let x_title = "Confidence Score (%)";
    let x_title_x = LEFT as i64 + (PLOT_W as i64 - text_width(x_title, 2) as i64) / 2;
    canvas.text(x_title_x, baseline + 30, x_title, 2, BLACK);
}
