//! progress-bar-plus - context-aware progress bars
//!
//! Tracks a single counter against an optional total and draws it in a way
//! that suits where output is going: an in-place line on a terminal, an
//! appended line in a log or redirected stream, or a display handle in a
//! notebook cell.
//!
//! # Architecture
//!
//! ```text
//! update() / iteration
//!        │
//!        ▼
//!   ProgressBar ──debounce──► Scheduler (deferred render)
//!        │
//!        ▼
//!   estimate() ──► Formatter ──► RenderTarget
//!                  (text/html)   (terminal line / log line / notebook)
//! ```
//!
//! # Modules
//!
//! - [`tracker`] - counter state, lifecycle and debounce
//! - [`estimator`] - elapsed time, throughput and remaining time
//! - [`format`] - text and HTML layouts
//! - [`target`] - where frames are drawn
//! - [`scheduler`] - deferred-render timers
//! - [`mode`] - execution-context detection
//! - [`config`] - settings and loading
//!
//! # Example
//!
//! ```ignore
//! use progress_bar_plus::ProgressIterExt;
//!
//! for file in files.iter().progress() {
//!     process(file)?;
//! }
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod estimator;
pub mod format;
pub mod mode;
pub mod scheduler;
pub mod target;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{ProgressError, RenderError};
pub use estimator::{Estimate, SampleWindow, estimate, format_duration, format_time};
pub use format::{DisplayPayload, Formatter};
pub use mode::{CallerLocation, EnvClassifier, FixedClassifier, ModeClassifier, RenderMode};
pub use scheduler::{ManualScheduler, Scheduler, ThreadScheduler, TokioScheduler};
pub use target::{InteractiveTarget, LineRegistry, MemoryTarget, NotebookTarget, RedirectedTarget, RenderTarget};
pub use tracker::{
    DisplayStatus, Entered, ExitGuard, Lifecycle, ProgressBar, ProgressBarBuilder, ProgressIter, ProgressIterExt,
    ProgressState, finalize_all, install_exit_hook, wrap,
};

/// Debounce for terminals and notebooks (seconds)
pub const DEFAULT_INTERACTIVE_DEBOUNCE_SECS: f64 = 0.1;

/// Debounce when output is redirected (seconds)
pub const DEFAULT_SCRIPT_DEBOUNCE_SECS: f64 = 60.0;

/// Text bar width in cells
pub const DEFAULT_BAR_WIDTH: usize = 30;

/// Samples kept for the short-term rate
pub const DEFAULT_SAMPLE_WINDOW: usize = 10;

/// Age at which the medium-term anchor sample is replaced (seconds)
pub const DEFAULT_ANCHOR_PERIOD_SECS: f64 = 60.0;
