//! Append-only rendering for pipes, files and log streams

use std::io::Write;

use tracing::{debug, info};

use super::RenderTarget;
use crate::error::RenderError;
use crate::format::DisplayPayload;

/// `tracing` target used for progress lines
pub const LOG_TARGET: &str = "progress_bar_plus";

/// Where redirected lines go
pub enum LineSink {
    /// One `info!` event per frame
    ///
    /// Silent unless a `tracing` subscriber is installed.
    Log,
    /// One newline-terminated line per frame
    Writer(Box<dyn Write + Send>),
}

impl LineSink {
    /// `Log` when a global subscriber is installed, stderr otherwise
    pub fn for_process() -> Self {
        if tracing::dispatcher::has_been_set() {
            Self::Log
        } else {
            debug!("LineSink::for_process: no subscriber, writing to stderr");
            Self::Writer(Box::new(std::io::stderr()))
        }
    }
}

/// Emits every frame as a complete line, no cursor control
pub struct RedirectedTarget {
    sink: LineSink,
}

impl RedirectedTarget {
    pub fn new(sink: LineSink) -> Self {
        Self { sink }
    }
}

impl RenderTarget for RedirectedTarget {
    fn emit(&mut self, payload: &DisplayPayload, _last: bool) -> Result<(), RenderError> {
        let line = payload.as_str();
        match &mut self.sink {
            LineSink::Log => {
                info!(target: LOG_TARGET, "{}", line);
            }
            LineSink::Writer(out) => {
                writeln!(out, "{line}")?;
                out.flush()?;
            }
        }
        Ok(())
    }
}
