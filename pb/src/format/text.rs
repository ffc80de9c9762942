//! Plain-text layout for terminals and log lines

use colored::{ColoredString, Colorize};

use super::{counts, throughput, time_block};
use crate::estimator::Estimate;
use crate::tracker::{DisplayStatus, ProgressState};

/// Eighth-cell blocks for the partially filled cell
const PARTIALS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

/// (filled, empty) glyphs per status
fn glyphs(status: DisplayStatus) -> (char, char) {
    match status {
        DisplayStatus::Running => ('█', ' '),
        DisplayStatus::Error => ('▚', '░'),
        DisplayStatus::Interrupted => ('█', '░'),
        DisplayStatus::Done => ('█', ' '),
        DisplayStatus::Stopped => ('▒', '░'),
    }
}

fn paint(s: &str, status: DisplayStatus) -> ColoredString {
    match status {
        DisplayStatus::Running => s.cyan(),
        DisplayStatus::Error => s.red(),
        DisplayStatus::Interrupted => s.yellow().bold(),
        DisplayStatus::Done => s.green(),
        DisplayStatus::Stopped => s.purple(),
    }
}

/// Draw a bar `width` cells wide
///
/// Fractions above 1.0 draw a full bar.
pub fn draw_bar(fraction: f64, status: DisplayStatus, width: usize, color: bool) -> String {
    let (fill, empty) = glyphs(status);
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    let cells = width as f64 * fraction;
    let full = (cells as usize).min(width);

    let mut filled: String = std::iter::repeat_n(fill, full).collect();
    let mut empties = 0;
    if full < width {
        let eighth = (((cells - full as f64) * 8.0) as usize).min(PARTIALS.len() - 1);
        filled.push(PARTIALS[eighth]);
        empties = width - full - 1;
    }
    let rest: String = std::iter::repeat_n(empty, empties).collect();

    if color {
        format!("{}{}", paint(&filled, status), rest)
    } else {
        format!("{filled}{rest}")
    }
}

/// `(status) pct% |bar| n/totalit [time iter] description` plus error lines
pub fn render_text(state: &ProgressState, estimate: &Estimate, bar_width: usize, color: bool) -> String {
    let status = state.display_status();
    let mut parts = Vec::with_capacity(6);

    parts.push(format!("({:^11})", status.as_str()));
    if let Some(fraction) = state.fraction() {
        let bar = draw_bar(fraction, status, bar_width, color);
        parts.push(format!("{:>5.1}% |{}|", fraction * 100.0, bar));
    }
    parts.push(format!("{}it", counts(state)));
    parts.push(format!("[{:<14} {:>14}]", time_block(state, estimate), throughput(estimate)));
    if !state.description.is_empty() {
        parts.push(state.description.clone());
    }

    let mut line = parts.join(" ");
    if let Some(detail) = &state.error_detail {
        line.push('\n');
        line.push_str(detail.trim_end());
    }
    line
}
