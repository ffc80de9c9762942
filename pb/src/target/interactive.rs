//! In-place terminal rendering
//!
//! Every live interactive tracker owns one terminal line, addressed by its
//! offset above the cursor line. A new tracker takes the cursor line and
//! pushes every other live tracker up by one. Entries whose tracker is gone
//! are pruned whenever the registry is touched.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, Weak};

use crossterm::cursor::{MoveToColumn, MoveUp, RestorePosition, SavePosition};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use tracing::debug;

use super::RenderTarget;
use crate::error::RenderError;
use crate::format::DisplayPayload;

/// A reserved terminal line
#[derive(Debug, Default)]
pub struct LineSlot {
    offset: AtomicUsize,
}

impl LineSlot {
    /// Lines above the cursor line
    pub fn offset(&self) -> usize {
        self.offset.load(Ordering::SeqCst)
    }

    fn bump(&self, by: usize) {
        self.offset.fetch_add(by, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct RegistryInner {
    slots: Vec<Weak<LineSlot>>,
    /// Whether the cursor line is unowned and blank
    line_free: bool,
}

impl RegistryInner {
    fn prune(&mut self) {
        self.slots.retain(|w| w.strong_count() > 0);
    }

    fn bump_all(&self, by: usize) {
        for slot in self.slots.iter().filter_map(Weak::upgrade) {
            slot.bump(by);
        }
    }
}

/// Line bookkeeping for one terminal
///
/// Holding the registry lock while writing keeps frames from concurrent
/// trackers from interleaving.
#[derive(Debug)]
pub struct LineRegistry {
    inner: Mutex<RegistryInner>,
}

static TERMINAL: LazyLock<Arc<LineRegistry>> = LazyLock::new(|| Arc::new(LineRegistry::new()));

impl LineRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                slots: Vec::new(),
                line_free: true,
            }),
        }
    }

    /// Registry for the process's own terminal
    pub fn global() -> Arc<LineRegistry> {
        TERMINAL.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of trackers still holding a line
    pub fn live_count(&self) -> usize {
        let mut inner = self.lock();
        inner.prune();
        inner.slots.len()
    }

    /// Reserve the cursor line, pushing live trackers up if it is taken
    fn claim(&self, out: &mut dyn Write) -> Arc<LineSlot> {
        let mut inner = self.lock();
        inner.prune();
        if !inner.line_free {
            debug!(live = inner.slots.len(), "LineRegistry::claim: cursor line taken, opening a new line");
            if let Err(e) = out.write_all(b"\n").and_then(|_| out.flush()) {
                debug!(error = %e, "LineRegistry::claim: failed to open line");
            }
            inner.bump_all(1);
        }
        inner.line_free = false;

        let slot = Arc::new(LineSlot::default());
        inner.slots.push(Arc::downgrade(&slot));
        slot
    }
}

impl Default for LineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrites its reserved terminal line on every frame
pub struct InteractiveTarget {
    registry: Arc<LineRegistry>,
    slot: Option<Arc<LineSlot>>,
    out: Box<dyn Write + Send>,
}

impl InteractiveTarget {
    pub fn new(registry: Arc<LineRegistry>, mut out: Box<dyn Write + Send>) -> Self {
        let slot = registry.claim(&mut *out);
        debug!(offset = slot.offset(), "InteractiveTarget::new: claimed line");
        Self {
            registry,
            slot: Some(slot),
            out,
        }
    }

    pub fn stdout() -> Self {
        Self::new(LineRegistry::global(), Box::new(std::io::stdout()))
    }

    /// Current line offset, `None` once the final frame was drawn
    pub fn offset(&self) -> Option<usize> {
        self.slot.as_ref().map(|s| s.offset())
    }

    /// Handle to the reserved line, for observing offset changes
    pub fn slot(&self) -> Option<Arc<LineSlot>> {
        self.slot.clone()
    }
}

impl RenderTarget for InteractiveTarget {
    fn emit(&mut self, payload: &DisplayPayload, last: bool) -> Result<(), RenderError> {
        let Some(slot) = self.slot.clone() else {
            debug!("InteractiveTarget::emit: line already released, skipping");
            return Ok(());
        };

        let mut inner = self.registry.lock();
        inner.prune();
        let offset = slot.offset();
        let text = payload.as_str();

        if offset == 0 {
            queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
            if last {
                // Final frame at the cursor line: leave it behind with any
                // error lines and hand the fresh line below to the next tracker
                queue!(self.out, Print(text), Print("\n"))?;
                self.out.flush()?;
                let added = text.lines().count().max(1);
                drop(slot);
                self.slot = None;
                inner.prune();
                inner.bump_all(added);
                inner.line_free = true;
                debug!(added, "InteractiveTarget::emit: released cursor line");
                return Ok(());
            }
            queue!(self.out, Print(text))?;
        } else {
            // Only the first line fits in a reserved slot above the cursor
            let first = text.lines().next().unwrap_or_default();
            let up = u16::try_from(offset).unwrap_or(u16::MAX);
            queue!(
                self.out,
                SavePosition,
                MoveUp(up),
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(first),
                RestorePosition
            )?;
            if last {
                drop(slot);
                self.slot = None;
                inner.prune();
                debug!(offset, "InteractiveTarget::emit: released line");
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
