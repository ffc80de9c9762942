//! Render formatting
//!
//! Turns tracker state and an [`Estimate`] into a [`DisplayPayload`],
//! independent of where the payload is drawn. Both layouts present, in
//! order: status, percentage, bar, counts, time block, description, error.

mod html;
mod text;

pub use html::render_html;
pub use text::{draw_bar, render_text};

use tracing::debug;

use crate::config::Config;
use crate::estimator::{Estimate, format_time};
use crate::mode::RenderMode;
use crate::tracker::{DisplayStatus, ProgressState};

/// A rendered frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayPayload {
    /// Single logical line (error detail may follow on extra lines)
    Text(String),
    /// HTML fragment for a notebook display handle
    Html(String),
}

impl DisplayPayload {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Html(s) => s,
        }
    }
}

/// Layout choice plus presentation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    pub markup: bool,
    pub bar_width: usize,
    pub color: bool,
}

impl Formatter {
    pub fn for_mode(mode: RenderMode, config: &Config) -> Self {
        debug!(?mode, "Formatter::for_mode: called");
        Self {
            markup: mode == RenderMode::Notebook,
            bar_width: config.bar_width,
            color: config.color && mode == RenderMode::Interactive,
        }
    }

    /// Plain text, no colors
    pub fn plain(bar_width: usize) -> Self {
        Self {
            markup: false,
            bar_width,
            color: false,
        }
    }

    pub fn format(&self, state: &ProgressState, estimate: &Estimate) -> DisplayPayload {
        if self.markup {
            DisplayPayload::Html(render_html(state, estimate))
        } else {
            DisplayPayload::Text(render_text(state, estimate, self.bar_width, self.color))
        }
    }
}

/// `elapsed`, followed by `<remaining` while a bounded tracker is running
fn time_block(state: &ProgressState, estimate: &Estimate) -> String {
    let mut time = format_time(estimate.elapsed.as_secs_f64());
    if state.known_total().is_some() && state.display_status() == DisplayStatus::Running {
        time.push('<');
        time.push_str(&format_time(estimate.remaining));
    }
    time
}

/// Throughput, as it/s when at least one per second, otherwise time per item
fn throughput(estimate: &Estimate) -> String {
    if estimate.iterations_per_second >= 1.0 {
        format!("{:.2}it/s", estimate.iterations_per_second)
    } else {
        format!("{}/it", format_time(estimate.per_iteration))
    }
}

fn counts(state: &ProgressState) -> String {
    match state.known_total() {
        Some(total) => format!("{}/{}", state.count, total),
        None => state.count.to_string(),
    }
}
