//! Progress tracking
//!
//! - [`ProgressBar`] - counter, lifecycle and debounced rendering
//! - [`ProgressIter`] - iterator adapter that drives a tracker
//! - [`finalize_all`] / [`install_exit_hook`] - process-exit fallback

mod bar;
mod exit;
mod iter;
mod state;

pub use bar::{Entered, ProgressBar, ProgressBarBuilder};
pub use exit::{ExitGuard, finalize_all, install_exit_hook, live_trackers};
pub use iter::{PANICKED, ProgressIter, ProgressIterExt, wrap};
pub use state::{DisplayStatus, INTERRUPTED, Lifecycle, ProgressState, STOPPED_PREMATURELY};
