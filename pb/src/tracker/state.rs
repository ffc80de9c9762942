//! Progress state and lifecycle

use std::time::Instant;

use tracing::debug;

/// Detail recorded when a running tracker is dropped without an outcome
pub const INTERRUPTED: &str = "Interrupted";

/// Marker recorded when a wrapped iteration is abandoned early
pub const STOPPED_PREMATURELY: &str = "Iterator stopped prematurely";

/// Tracker lifecycle
///
/// `Created` moves to `Running` on the first update. `Done`, `Stopped` and
/// `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Created,
    Running,
    Done,
    Stopped,
    Errored,
}

impl Lifecycle {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Stopped | Self::Errored)
    }
}

/// Status as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Running,
    Done,
    Stopped,
    Error,
    Interrupted,
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Done => "done",
            Self::Stopped => "stopped",
            Self::Error => "error",
            Self::Interrupted => "interrupted",
        }
    }
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter, label, timing and lifecycle of one tracker
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Units completed; never decreases except through `reset`
    pub count: u64,
    /// Target count, `None` when unbounded
    pub total: Option<u64>,
    pub description: String,
    /// Stamped when the tracker starts running
    pub start_time: Option<Instant>,
    /// Last time a frame was emitted
    pub last_render_time: Option<Instant>,
    pub status: Lifecycle,
    /// Diagnostic text, only set when `status` is `Errored`
    pub error_detail: Option<String>,
    /// Why a `Stopped` tracker stopped, if it was not a plain close
    pub stop_reason: Option<String>,
}

impl ProgressState {
    pub fn new(total: Option<u64>, description: impl Into<String>) -> Self {
        Self {
            count: 0,
            total,
            description: description.into(),
            start_time: None,
            last_render_time: None,
            status: Lifecycle::Created,
            error_detail: None,
            stop_reason: None,
        }
    }

    /// Total usable for percentages; zero counts as unknown
    pub fn known_total(&self) -> Option<u64> {
        self.total.filter(|t| *t > 0)
    }

    /// Fraction complete, unbounded above 1.0
    pub fn fraction(&self) -> Option<f64> {
        self.known_total().map(|t| self.count as f64 / t as f64)
    }

    /// Enter `Running`, stamping the start time
    ///
    /// Returns true if this call performed the transition.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.status != Lifecycle::Created {
            return false;
        }
        debug!(description = %self.description, "ProgressState::start: Created -> Running");
        self.status = Lifecycle::Running;
        self.start_time = Some(now);
        true
    }

    pub fn finish(&mut self) {
        if !self.status.is_terminal() {
            debug!(description = %self.description, "ProgressState::finish: -> Done");
            self.status = Lifecycle::Done;
        }
    }

    pub fn stop(&mut self, reason: Option<&str>) {
        if !self.status.is_terminal() {
            debug!(description = %self.description, ?reason, "ProgressState::stop: -> Stopped");
            self.status = Lifecycle::Stopped;
            self.stop_reason = reason.map(str::to_string);
        }
    }

    /// Mark errored; the first error wins
    pub fn fail(&mut self, detail: impl Into<String>) {
        if !self.status.is_terminal() {
            let detail = detail.into();
            debug!(description = %self.description, %detail, "ProgressState::fail: -> Errored");
            self.status = Lifecycle::Errored;
            self.error_detail = Some(detail);
        }
    }

    pub fn display_status(&self) -> DisplayStatus {
        match self.status {
            Lifecycle::Created | Lifecycle::Running => DisplayStatus::Running,
            Lifecycle::Done => DisplayStatus::Done,
            Lifecycle::Stopped => DisplayStatus::Stopped,
            Lifecycle::Errored if self.error_detail.as_deref() == Some(INTERRUPTED) => DisplayStatus::Interrupted,
            Lifecycle::Errored => DisplayStatus::Error,
        }
    }
}
