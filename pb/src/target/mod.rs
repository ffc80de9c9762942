//! Render targets
//!
//! A target decides how a finished frame reaches the user. Each completed
//! render produces exactly one emission: a terminal line rewrite, a log
//! line, or a display-handle update.

mod interactive;
mod notebook;
mod redirected;

pub use interactive::{InteractiveTarget, LineRegistry, LineSlot};
pub use notebook::{DisplayHandle, EvcxrDisplay, NotebookTarget};
pub use redirected::{LOG_TARGET, LineSink, RedirectedTarget};

use std::sync::{Arc, Mutex};

use crate::error::RenderError;
use crate::format::DisplayPayload;
use crate::mode::RenderMode;

/// Destination for rendered frames
pub trait RenderTarget: Send {
    /// Emit one frame; `last` is set for the final frame of a finished tracker
    fn emit(&mut self, payload: &DisplayPayload, last: bool) -> Result<(), RenderError>;
}

/// Build the standard target for a mode, writing to the process streams
pub fn target_for_mode(mode: RenderMode) -> Box<dyn RenderTarget> {
    match mode {
        RenderMode::Interactive => Box::new(InteractiveTarget::stdout()),
        RenderMode::Notebook => Box::new(NotebookTarget::new(Box::new(EvcxrDisplay::stdout()))),
        RenderMode::Redirected => Box::new(RedirectedTarget::new(LineSink::for_process())),
    }
}

/// A frame captured by [`MemoryTarget`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: DisplayPayload,
    pub last: bool,
}

/// Keeps every frame in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text of the most recent frame
    pub fn last_text(&self) -> Option<String> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .map(|f| f.payload.as_str().to_string())
    }
}

impl RenderTarget for MemoryTarget {
    fn emit(&mut self, payload: &DisplayPayload, last: bool) -> Result<(), RenderError> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).push(Frame {
            payload: payload.clone(),
            last,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_target_shares_frames() {
        let target = MemoryTarget::new();
        let mut writer = target.clone();

        writer
            .emit(&DisplayPayload::Text("one".to_string()), false)
            .expect("emit should succeed");
        writer
            .emit(&DisplayPayload::Text("two".to_string()), true)
            .expect("emit should succeed");

        assert_eq!(target.len(), 2);
        assert_eq!(target.last_text().as_deref(), Some("two"));
        assert!(target.frames()[1].last);
    }
}
