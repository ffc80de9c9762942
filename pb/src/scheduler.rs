//! Deferred-render scheduling
//!
//! The tracker never waits on a scheduled task. A deferred render that wakes
//! after its tracker closed checks the closed flag and does nothing, so
//! cancellation is implicit.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tracing::debug;

use crate::clock::Clock;

/// Work run once a delay has passed
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task after a delay, off the caller's stack
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task);
}

/// Spawns onto a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running in, if any
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        debug!(?delay, "TokioScheduler::schedule: called");
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

/// One short-lived sleeper thread per deferred render
///
/// Trackers keep at most one render in flight, so this never fans out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        debug!(?delay, "ThreadScheduler::schedule: called");
        let spawned = std::thread::Builder::new()
            .name("progress-render".to_string())
            .spawn(move || {
                std::thread::sleep(delay);
                task();
            });
        if let Err(e) = spawned {
            debug!(error = %e, "ThreadScheduler::schedule: spawn failed, dropping render");
        }
    }
}

/// Tokio when called from inside a runtime, a sleeper thread otherwise
pub fn default_scheduler() -> Arc<dyn Scheduler> {
    match TokioScheduler::try_current() {
        Some(tokio) => Arc::new(tokio),
        None => Arc::new(ThreadScheduler),
    }
}

struct Pending {
    due: Instant,
    task: Task,
}

/// Queues tasks until the test driving it says they are due
pub struct ManualScheduler {
    clock: Arc<dyn Clock>,
    pending: Mutex<Vec<Pending>>,
    scheduled: Mutex<usize>,
}

impl ManualScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            pending: Mutex::new(Vec::new()),
            scheduled: Mutex::new(0),
        }
    }

    /// Tasks scheduled so far, fired or not
    pub fn scheduled_count(&self) -> usize {
        *self.scheduled.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Run every task whose deadline has passed; returns how many ran
    pub fn run_due(&self) -> usize {
        let now = self.clock.now();
        let due: Vec<Pending> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            let (due, later) = std::mem::take(&mut *pending).into_iter().partition(|p| p.due <= now);
            *pending = later;
            due
        };
        let ran = due.len();
        for p in due {
            (p.task)();
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let due = self.clock.now() + delay;
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).push(Pending { due, task });
        *self.scheduled.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}
