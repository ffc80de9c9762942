//! Execution-context detection
//!
//! A tracker asks a [`ModeClassifier`] once, at construction, which kind of
//! output it is writing to. The answer fixes both the debounce rate and the
//! render target for the tracker's lifetime.

use std::io::IsTerminal;
use std::panic::Location;

use tracing::debug;

/// Where progress output ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// A terminal that supports in-place line rewrites
    Interactive,
    /// A notebook cell with a mutable display handle
    Notebook,
    /// A pipe, file or batch-job log; lines are appended
    Redirected,
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interactive => write!(f, "interactive"),
            Self::Notebook => write!(f, "notebook"),
            Self::Redirected => write!(f, "redirected"),
        }
    }
}

/// Answers "what kind of output is this process writing to"
pub trait ModeClassifier: Send + Sync {
    fn current_mode(&self) -> RenderMode;
}

/// Always reports the same mode
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier(pub RenderMode);

impl ModeClassifier for FixedClassifier {
    fn current_mode(&self) -> RenderMode {
        self.0
    }
}

/// SLURM job name used by interactive JupyterLab sessions on clusters
const SLURM_JUPYTER_JOB: &str = "sys/dashboard/sys/jupyterlab";

/// Classifies from environment variables and whether stdout is a terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvClassifier;

impl EnvClassifier {
    /// Decision logic, separated from the process environment
    pub fn classify(lookup: impl Fn(&str) -> Option<String>, stdout_is_tty: bool) -> RenderMode {
        let in_notebook = lookup("EVCXR_IS_RUNTIME").is_some() || lookup("JPY_PARENT_PID").is_some();
        if in_notebook {
            debug!("EnvClassifier::classify: notebook kernel detected");
            return RenderMode::Notebook;
        }

        let in_batch_job = lookup("SLURM_JOB_NAME").is_some_and(|name| !name.is_empty() && name != SLURM_JUPYTER_JOB);
        if in_batch_job {
            debug!("EnvClassifier::classify: batch job detected");
            return RenderMode::Redirected;
        }

        if stdout_is_tty {
            RenderMode::Interactive
        } else {
            RenderMode::Redirected
        }
    }
}

impl ModeClassifier for EnvClassifier {
    fn current_mode(&self) -> RenderMode {
        Self::classify(|key| std::env::var(key).ok(), std::io::stdout().is_terminal())
    }
}

/// Apply construction-time overrides on top of the detected mode
///
/// Forcing script mode wins over forcing interactive mode.
pub fn resolve_mode(detected: RenderMode, force_script: bool, force_interactive: bool) -> RenderMode {
    let mode = if force_script {
        RenderMode::Redirected
    } else if force_interactive {
        RenderMode::Interactive
    } else {
        detected
    };
    debug!(?detected, force_script, force_interactive, ?mode, "resolve_mode: resolved");
    mode
}

/// Where a tracker was created, used as its default description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerLocation {
    pub file: &'static str,
    pub line: u32,
}

impl CallerLocation {
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// `file.rs:42`, without the directory
    pub fn label(&self) -> String {
        let name = self.file.rsplit(['/', '\\']).next().unwrap_or(self.file);
        format!("{}:{}", name, self.line)
    }
}
