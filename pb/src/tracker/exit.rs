//! Process-exit finalization
//!
//! Every tracker registers here at construction. Scoped use and `Drop` are
//! the normal way a tracker finishes; [`finalize_all`] catches trackers still
//! running when the process winds down (leaked, or owned by a static).

use std::sync::{Arc, LazyLock, Mutex, Weak};

use tracing::debug;

use super::bar::Shared;

static LIVE: LazyLock<Mutex<Vec<Weak<Shared>>>> = LazyLock::new(|| Mutex::new(Vec::new()));

pub(crate) fn register(shared: &Arc<Shared>) {
    let mut live = LIVE.lock().unwrap_or_else(|e| e.into_inner());
    live.retain(|w| w.strong_count() > 0);
    live.push(Arc::downgrade(shared));
}

/// Trackers that have not been dropped yet
pub fn live_trackers() -> usize {
    let mut live = LIVE.lock().unwrap_or_else(|e| e.into_inner());
    live.retain(|w| w.strong_count() > 0);
    live.len()
}

/// Draw a final frame for every tracker that is still running
///
/// Returns the number of trackers rendered.
pub fn finalize_all() -> usize {
    let trackers: Vec<Arc<Shared>> = {
        let mut live = LIVE.lock().unwrap_or_else(|e| e.into_inner());
        live.retain(|w| w.strong_count() > 0);
        live.iter().filter_map(Weak::upgrade).collect()
    };
    let rendered = trackers.iter().filter(|shared| shared.finalize_on_exit()).count();
    debug!(candidates = trackers.len(), rendered, "finalize_all: done");
    rendered
}

/// Runs [`finalize_all`] when dropped
///
/// Hold it for the lifetime of `main`. `std::process::exit` skips
/// destructors, so call [`finalize_all`] directly before exiting that way.
#[must_use = "the hook runs when the guard is dropped"]
pub struct ExitGuard {
    _private: (),
}

pub fn install_exit_hook() -> ExitGuard {
    debug!("install_exit_hook: called");
    ExitGuard { _private: () }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        finalize_all();
    }
}
