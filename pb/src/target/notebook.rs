//! Notebook display-handle rendering

use std::io::Write;

use tracing::debug;

use super::RenderTarget;
use crate::error::RenderError;
use crate::format::DisplayPayload;

/// A mutable output area in a notebook cell
pub trait DisplayHandle: Send {
    /// Display the handle for the first time
    fn show(&mut self, html: &str) -> Result<(), RenderError>;

    /// Replace the handle's content; `last` marks the final frame
    fn update(&mut self, html: &str, last: bool) -> Result<(), RenderError>;
}

/// Writes `text/html` content blocks in the evcxr Jupyter kernel protocol
///
/// The protocol appends blocks and cannot replace one, so the handle writes
/// the first frame and the final frame only. Intermediate frames are held
/// back and nothing is written after the final block.
pub struct EvcxrDisplay {
    out: Box<dyn Write + Send>,
    held: u64,
    finished: bool,
}

impl EvcxrDisplay {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            held: 0,
            finished: false,
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Intermediate frames not written
    pub fn held_frames(&self) -> u64 {
        self.held
    }

    fn block(&mut self, html: &str) -> Result<(), RenderError> {
        if self.finished {
            return Err(RenderError::HandleClosed);
        }
        writeln!(self.out, "EVCXR_BEGIN_CONTENT text/html\n{html}\nEVCXR_END_CONTENT")?;
        self.out.flush()?;
        Ok(())
    }
}

impl DisplayHandle for EvcxrDisplay {
    fn show(&mut self, html: &str) -> Result<(), RenderError> {
        self.block(html)
    }

    fn update(&mut self, html: &str, last: bool) -> Result<(), RenderError> {
        if !last {
            if self.finished {
                return Err(RenderError::HandleClosed);
            }
            self.held += 1;
            return Ok(());
        }
        self.block(html)?;
        debug!(held = self.held, "EvcxrDisplay::update: final block written");
        self.finished = true;
        Ok(())
    }
}

/// Shows one display handle and overwrites it on every frame
pub struct NotebookTarget {
    handle: Box<dyn DisplayHandle>,
    shown: bool,
}

impl NotebookTarget {
    pub fn new(handle: Box<dyn DisplayHandle>) -> Self {
        Self { handle, shown: false }
    }
}

impl RenderTarget for NotebookTarget {
    fn emit(&mut self, payload: &DisplayPayload, last: bool) -> Result<(), RenderError> {
        let html = payload.as_str();
        if self.shown {
            self.handle.update(html, last)
        } else {
            debug!("NotebookTarget::emit: showing display handle");
            self.handle.show(html)?;
            self.shown = true;
            Ok(())
        }
    }
}
