//! Block-character bar graphs for the terminal.

const LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One row of vertical bars for a visualiser frame, `width` columns wide.
///
/// Bins are averaged into columns; an empty frame renders as blanks.
pub fn render_bars(frame: &[u8], width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if frame.is_empty() {
        return " ".repeat(width);
    }

    (0..width)
        .map(|col| {
            let start = col * frame.len() / width;
            let end = ((col + 1) * frame.len() / width).max(start + 1).min(frame.len());
            let slice = &frame[start..end];
            let avg = slice.iter().map(|&v| v as usize).sum::<usize>() / slice.len();
            LEVELS[avg * (LEVELS.len() - 1) / 255]
        })
        .collect()
}

/// Horizontal meter such as `█████░░░░░`, with `value` clamped to
/// `0..=full_mark`.
pub fn render_meter(value: f64, full_mark: f64, width: usize) -> String {
    let ratio = if full_mark > 0.0 && value.is_finite() {
        (value / full_mark).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
