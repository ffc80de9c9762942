//! The progress tracker
//!
//! [`ProgressBar`] owns the counter, timing and lifecycle, and decides when a
//! frame is drawn. A render request runs immediately when at least one
//! debounce interval has passed since the last frame; otherwise a single
//! deferred render is scheduled for the rest of the interval and later
//! requests coalesce into it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use super::exit;
use super::state::{INTERRUPTED, Lifecycle, ProgressState};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::estimator::{Estimate, SampleWindow, estimate};
use crate::format::{DisplayPayload, Formatter};
use crate::mode::{CallerLocation, EnvClassifier, ModeClassifier, RenderMode, resolve_mode};
use crate::scheduler::{Scheduler, default_scheduler};
use crate::target::{RenderTarget, target_for_mode};

pub(crate) struct Core {
    pub(crate) state: ProgressState,
    window: SampleWindow,
    formatter: Formatter,
    target: Box<dyn RenderTarget>,
    /// A deferred render is scheduled and has not fired yet
    deferred_in_flight: bool,
    closed: bool,
    renders: u64,
}

/// Tracker internals shared with deferred renders and the exit registry
pub(crate) struct Shared {
    core: Mutex<Core>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    debounce: Duration,
    mode: RenderMode,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Draw a frame now, whatever the debounce state
    fn render(&self, core: &mut Core, last: bool) {
        let now = self.clock.now();
        core.state.last_render_time = Some(now);
        let estimate: Estimate = estimate(&core.state, &core.window);
        let payload: DisplayPayload = core.formatter.format(&core.state, &estimate);
        if let Err(e) = core.target.emit(&payload, last) {
            debug!(error = %e, "Shared::render: render failed, ignoring");
        }
        core.renders += 1;
    }

    /// Render now or defer, depending on the time since the last frame
    fn request_render(self: &Arc<Self>, core: &mut Core) {
        if core.closed {
            debug!("Shared::request_render: tracker closed, not rendering");
            return;
        }
        let now = self.clock.now();
        let since_last = core.state.last_render_time.map(|last| now.saturating_duration_since(last));

        match since_last {
            Some(since) if since < self.debounce => {
                if core.deferred_in_flight {
                    debug!("Shared::request_render: coalesced into pending render");
                    return;
                }
                core.deferred_in_flight = true;
                let wait = self.debounce - since;
                debug!(?wait, "Shared::request_render: deferring render");
                let weak = Arc::downgrade(self);
                self.scheduler.schedule(
                    wait,
                    Box::new(move || {
                        if let Some(shared) = weak.upgrade() {
                            shared.fire_deferred();
                        }
                    }),
                );
            }
            _ => self.render(core, false),
        }
    }

    fn fire_deferred(&self) {
        let mut core = self.lock();
        core.deferred_in_flight = false;
        if core.closed {
            debug!("Shared::fire_deferred: tracker closed, suppressing render");
            return;
        }
        self.render(&mut core, false);
    }

    fn close(&self, core: &mut Core) {
        if !core.closed {
            debug!(description = %core.state.description, "Shared::close: closing");
            core.closed = true;
            core.state.stop(None);
        }
        self.render(core, true);
    }

    /// Final frame for a tracker still running at process exit
    ///
    /// Returns true if a frame was drawn.
    pub(crate) fn finalize_on_exit(&self) -> bool {
        let mut core = self.lock();
        if core.closed || core.state.status != Lifecycle::Running {
            return false;
        }
        debug!(description = %core.state.description, "Shared::finalize_on_exit: forcing final render");
        self.render(&mut core, true);
        true
    }
}

/// Tracks one counter against an optional total
///
/// ```ignore
/// use progress_bar_plus::ProgressBar;
///
/// let bar = ProgressBar::builder().total(3).description("copying").build();
/// for _ in 0..3 {
///     bar.update(1);
/// }
/// bar.close();
/// ```
pub struct ProgressBar {
    pub(crate) shared: Arc<Shared>,
}

impl ProgressBar {
    /// Tracker with default settings, described by the caller's location
    #[track_caller]
    pub fn new(total: impl Into<Option<u64>>) -> Self {
        Self::builder().maybe_total(total.into()).build()
    }

    #[track_caller]
    pub fn builder() -> ProgressBarBuilder {
        ProgressBarBuilder::new(CallerLocation::from_location(std::panic::Location::caller()))
    }

    /// Advance the counter by `n`
    pub fn update(&self, n: u64) {
        let mut core = self.shared.lock();
        let now = self.shared.clock.now();
        start_if_needed(&mut core, now);
        core.state.count = core.state.count.saturating_add(n);
        let count = core.state.count;
        core.window.record(now, count);
        self.shared.request_render(&mut core);
    }

    pub fn inc(&self) {
        self.update(1);
    }

    pub fn set_description(&self, text: impl Into<String>) {
        let mut core = self.shared.lock();
        core.state.description = text.into();
        self.shared.request_render(&mut core);
    }

    /// Zero the counter and redraw; the start time is kept
    pub fn reset(&self) {
        let mut core = self.shared.lock();
        debug!(description = %core.state.description, "ProgressBar::reset: called");
        let now = self.shared.clock.now();
        core.state.count = 0;
        core.window.restart(now, 0);
        self.shared.render(&mut core, false);
    }

    /// Stop the tracker and draw its final frame
    ///
    /// Safe to call repeatedly: later calls only redraw.
    pub fn close(&self) {
        let mut core = self.shared.lock();
        self.shared.close(&mut core);
    }

    /// Mark the work as complete, then close
    pub fn finish(&self) {
        let mut core = self.shared.lock();
        core.state.finish();
        self.shared.close(&mut core);
    }

    /// Record an error, then close
    pub fn fail(&self, detail: impl Into<String>) {
        let mut core = self.shared.lock();
        core.state.fail(detail);
        self.shared.close(&mut core);
    }

    /// Draw a frame immediately, ignoring the debounce interval
    pub fn render_now(&self) {
        let mut core = self.shared.lock();
        self.shared.render(&mut core, false);
    }

    /// Close automatically when the returned guard goes out of scope
    pub fn enter(&self) -> Entered<'_> {
        Entered { bar: self }
    }

    pub(crate) fn start_iteration(&self) {
        let mut core = self.shared.lock();
        let now = self.shared.clock.now();
        start_if_needed(&mut core, now);
    }

    pub(crate) fn stop_early(&self, reason: &str) {
        let mut core = self.shared.lock();
        core.state.stop(Some(reason));
        self.shared.close(&mut core);
    }

    pub fn count(&self) -> u64 {
        self.shared.lock().state.count
    }

    pub fn total(&self) -> Option<u64> {
        self.shared.lock().state.total
    }

    pub(crate) fn set_total_if_unknown(&self, total: Option<u64>) {
        let mut core = self.shared.lock();
        if core.state.total.is_none() {
            core.state.total = total;
        }
    }

    pub fn description(&self) -> String {
        self.shared.lock().state.description.clone()
    }

    pub fn status(&self) -> Lifecycle {
        self.shared.lock().state.status
    }

    pub fn error_detail(&self) -> Option<String> {
        self.shared.lock().state.error_detail.clone()
    }

    pub fn stop_reason(&self) -> Option<String> {
        self.shared.lock().state.stop_reason.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ProgressState {
        self.shared.lock().state.clone()
    }

    pub fn mode(&self) -> RenderMode {
        self.shared.mode
    }

    pub fn debounce(&self) -> Duration {
        self.shared.debounce
    }

    /// Frames drawn so far
    pub fn render_count(&self) -> u64 {
        self.shared.lock().renders
    }

    /// Whether a deferred render is waiting to fire
    pub fn has_pending_render(&self) -> bool {
        self.shared.lock().deferred_in_flight
    }
}

fn start_if_needed(core: &mut Core, now: std::time::Instant) {
    if core.state.start(now) {
        let count = core.state.count;
        core.window.restart(now, count);
    }
}

impl std::fmt::Debug for ProgressBar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.shared.lock();
        f.debug_struct("ProgressBar")
            .field("mode", &self.shared.mode)
            .field("state", &core.state)
            .field("closed", &core.closed)
            .finish()
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        let mut core = self.shared.lock();
        if core.closed {
            return;
        }
        if core.state.status == Lifecycle::Running {
            debug!(description = %core.state.description, "ProgressBar::drop: abandoned while running");
            core.state.fail(INTERRUPTED);
        }
        self.shared.close(&mut core);
    }
}

/// Scope guard returned by [`ProgressBar::enter`]
pub struct Entered<'a> {
    bar: &'a ProgressBar,
}

impl std::ops::Deref for Entered<'_> {
    type Target = ProgressBar;

    fn deref(&self) -> &ProgressBar {
        self.bar
    }
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.bar.close();
    }
}

/// Construction parameters for a [`ProgressBar`]
pub struct ProgressBarBuilder {
    total: Option<u64>,
    description: Option<String>,
    caller: CallerLocation,
    force_script_mode: bool,
    force_interactive_mode: bool,
    debounce: Option<Duration>,
    config: Option<Config>,
    classifier: Option<Arc<dyn ModeClassifier>>,
    target: Option<Box<dyn RenderTarget>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ProgressBarBuilder {
    fn new(caller: CallerLocation) -> Self {
        Self {
            total: None,
            description: None,
            caller,
            force_script_mode: false,
            force_interactive_mode: false,
            debounce: None,
            config: None,
            classifier: None,
            target: None,
            scheduler: None,
            clock: None,
        }
    }

    pub fn total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn maybe_total(mut self, total: Option<u64>) -> Self {
        self.total = total;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append-only output, whatever the environment looks like
    pub fn force_script_mode(mut self, force: bool) -> Self {
        self.force_script_mode = force;
        self
    }

    /// In-place terminal output, unless script mode is also forced
    pub fn force_interactive_mode(mut self, force: bool) -> Self {
        self.force_interactive_mode = force;
        self
    }

    /// Minimum time between frames, replacing the mode default
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = Some(debounce);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn ModeClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Draw to this target instead of the mode's standard one
    pub fn target(mut self, target: Box<dyn RenderTarget>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> ProgressBar {
        let config = self.config.unwrap_or_else(|| Config::global().clone());
        let classifier = self.classifier.unwrap_or_else(|| Arc::new(EnvClassifier));
        let mode = resolve_mode(
            classifier.current_mode(),
            self.force_script_mode,
            self.force_interactive_mode,
        );
        let debounce = self.debounce.unwrap_or(match mode {
            RenderMode::Interactive | RenderMode::Notebook => config.interactive_debounce(),
            RenderMode::Redirected => config.script_debounce(),
        });
        let description = self.description.unwrap_or_else(|| self.caller.label());
        debug!(%mode, ?debounce, total = ?self.total, %description, "ProgressBarBuilder::build: called");

        let core = Core {
            state: ProgressState::new(self.total, description),
            window: SampleWindow::from_config(&config),
            formatter: Formatter::for_mode(mode, &config),
            target: self.target.unwrap_or_else(|| target_for_mode(mode)),
            deferred_in_flight: false,
            closed: false,
            renders: 0,
        };
        let shared = Arc::new(Shared {
            core: Mutex::new(core),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            scheduler: self.scheduler.unwrap_or_else(default_scheduler),
            debounce,
            mode,
        });
        exit::register(&shared);

        let bar = ProgressBar { shared };
        if mode == RenderMode::Notebook {
            // The display handle is shown once, up front
            bar.render_now();
        }
        bar
    }
}
