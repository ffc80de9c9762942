//! Time and rate estimation
//!
//! Per-iteration time is the plain mean of up to three estimators:
//! - **window**: oldest vs newest sample in a short ring buffer
//! - **anchor**: a single reference sample refreshed once per anchor period
//! - **full run**: elapsed time over the whole count, always present once
//!   any progress has been made

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::Config;
use crate::tracker::ProgressState;

/// A single (timestamp, count) observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub time: Instant,
    pub count: u64,
}

/// Recent samples plus the rolling anchor, fed by tracker updates
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
    anchor: Option<Sample>,
    anchor_period: Duration,
    anchor_min_delta: u64,
}

impl SampleWindow {
    pub fn new(capacity: usize, anchor_period: Duration) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            anchor: None,
            anchor_period,
            anchor_min_delta: 5,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut window = Self::new(config.sample_window, config.anchor_period());
        window.anchor_min_delta = config.anchor_min_delta;
        window
    }

    /// Forget all samples and anchor at `(at, count)`
    pub fn restart(&mut self, at: Instant, count: u64) {
        debug!(count, "SampleWindow::restart: called");
        self.samples.clear();
        self.anchor = Some(Sample { time: at, count });
    }

    /// Append an observation, evicting the oldest once full
    pub fn record(&mut self, at: Instant, count: u64) {
        let sample = Sample { time: at, count };
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);

        match self.anchor {
            Some(anchor) if at.saturating_duration_since(anchor.time) <= self.anchor_period => {}
            _ => {
                debug!(count, "SampleWindow::record: replacing anchor");
                self.anchor = Some(sample);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn anchor(&self) -> Option<Sample> {
        self.anchor
    }

    fn window_estimate(&self) -> Option<f64> {
        let oldest = self.samples.front()?;
        let newest = self.samples.back()?;
        let dn = newest.count.checked_sub(oldest.count).filter(|d| *d > 0)?;
        let dt = newest.time.saturating_duration_since(oldest.time);
        if dt.is_zero() {
            return None;
        }
        Some(dt.as_secs_f64() / dn as f64)
    }

    fn anchor_estimate(&self, now: Instant, count: u64) -> Option<f64> {
        let anchor = self.anchor?;
        let dt = now.saturating_duration_since(anchor.time);
        let dn = count.checked_sub(anchor.count)?;
        if dt.is_zero() || dn <= self.anchor_min_delta {
            return None;
        }
        Some(dt.as_secs_f64() / dn as f64)
    }
}

/// Derived timing figures for one render
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimate {
    /// Time between the first update and the latest render
    pub elapsed: Duration,
    /// Seconds per unit of progress
    pub per_iteration: f64,
    /// Projected seconds until `total` is reached, zero when unknown
    pub remaining: f64,
    pub iterations_per_second: f64,
}

/// Compute elapsed time, throughput and time remaining
pub fn estimate(state: &ProgressState, window: &SampleWindow) -> Estimate {
    let elapsed = match (state.start_time, state.last_render_time) {
        (Some(start), Some(last)) => last.saturating_duration_since(start),
        _ => Duration::ZERO,
    };

    if state.count == 0 {
        return Estimate {
            elapsed,
            ..Default::default()
        };
    }

    let mut estimates = Vec::with_capacity(3);
    if let Some(per) = window.window_estimate() {
        estimates.push(per);
    }
    if let Some(last) = state.last_render_time
        && let Some(per) = window.anchor_estimate(last, state.count)
    {
        estimates.push(per);
    }
    estimates.push(elapsed.as_secs_f64() / state.count as f64);

    let per_iteration = estimates.iter().sum::<f64>() / estimates.len() as f64;
    let remaining = match state.known_total() {
        Some(total) => total.saturating_sub(state.count) as f64 * per_iteration,
        None => 0.0,
    };
    let iterations_per_second = if per_iteration > 0.0 { 1.0 / per_iteration } else { 0.0 };

    debug!(
        count = state.count,
        estimators = estimates.len(),
        per_iteration,
        "estimate: computed"
    );

    Estimate {
        elapsed,
        per_iteration,
        remaining,
        iterations_per_second,
    }
}

/// Format seconds with precision that shrinks as the value grows
///
/// | range       | example        |
/// |-------------|----------------|
/// | < 2s        | `01.9999s`     |
/// | < 1 minute  | `0:05.25`      |
/// | < 1 hour    | `1:00`         |
/// | < 1 day     | `1:00:00`      |
/// | otherwise   | `1d, 0:00:00`  |
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    if seconds < 2.0 {
        return format!("{seconds:07.4}s");
    }
    if seconds < 60.0 {
        return format!("0:{seconds:05.2}");
    }

    let whole = seconds as u64;
    if whole < 3600 {
        format!("{}:{:02}", whole / 60, whole % 60)
    } else if whole < 86_400 {
        format!("{}:{:02}:{:02}", whole / 3600, (whole % 3600) / 60, whole % 60)
    } else {
        let rest = whole % 86_400;
        format!(
            "{}d, {}:{:02}:{:02}",
            whole / 86_400,
            rest / 3600,
            (rest % 3600) / 60,
            rest % 60
        )
    }
}

/// [`format_time`] for a [`Duration`]
pub fn format_duration(duration: Duration) -> String {
    format_time(duration.as_secs_f64())
}
