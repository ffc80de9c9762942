//! Iterator wrapping
//!
//! An element is counted when the next one is requested, so the count
//! reflects loop bodies that actually finished.

use std::any::Any;
use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use tracing::debug;

use super::bar::ProgressBar;
use super::state::STOPPED_PREMATURELY;

/// Detail recorded when a loop body panics
pub const PANICKED: &str = "panicked while iterating";

/// Yields the wrapped iterator's items unchanged while advancing a tracker
///
/// - exhausting the iterator marks the tracker `Done`
/// - dropping it early marks the tracker `Stopped`
/// - a panic in the loop body marks it `Errored`
pub struct ProgressIter<I> {
    inner: I,
    bar: ProgressBar,
    started: bool,
    /// An element was handed out and not yet counted
    pending: bool,
    /// The tracker was closed by this adapter
    settled: bool,
}

impl<I: Iterator> ProgressIter<I> {
    pub(crate) fn new(inner: I, bar: ProgressBar) -> Self {
        let (lower, upper) = inner.size_hint();
        if upper == Some(lower) {
            bar.set_total_if_unknown(Some(lower as u64));
        }
        Self {
            inner,
            bar,
            started: false,
            pending: false,
            settled: false,
        }
    }

    /// The tracker driven by this iterator
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    /// Run a fallible body over every item
    ///
    /// On the first `Err` the tracker records the error text, shows the
    /// error state, and the error is returned unchanged.
    pub fn try_for_each_tracked<E, F>(mut self, mut body: F) -> Result<(), E>
    where
        E: Display,
        F: FnMut(I::Item) -> Result<(), E>,
    {
        while let Some(item) = self.next() {
            if let Err(e) = body(item) {
                debug!(error = %e, "ProgressIter::try_for_each_tracked: body failed");
                self.settled = true;
                self.bar.fail(format!("{e:#}"));
                return Err(e);
            }
        }
        Ok(())
    }

    /// Run a body over every item, keeping the panic message if it panics
    ///
    /// A plain `for` loop only sees that unwinding happened. Here the
    /// payload is caught, recorded as `panicked while iterating: <message>`,
    /// and the panic resumes.
    pub fn for_each_tracked<F>(mut self, mut body: F)
    where
        F: FnMut(I::Item),
    {
        while let Some(item) = self.next() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| body(item))) {
                let detail = panic_detail(payload.as_ref());
                debug!(%detail, "ProgressIter::for_each_tracked: body panicked");
                self.settled = true;
                self.bar.fail(detail);
                resume_unwind(payload);
            }
        }
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str));
    match message {
        Some(message) => format!("{PANICKED}: {message}"),
        None => PANICKED.to_string(),
    }
}

impl<I: Iterator> Iterator for ProgressIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.settled {
            return None;
        }
        if !self.started {
            self.started = true;
            self.bar.start_iteration();
        }
        if self.pending {
            self.pending = false;
            self.bar.update(1);
        }
        match self.inner.next() {
            Some(item) => {
                self.pending = true;
                Some(item)
            }
            None => {
                debug!("ProgressIter::next: exhausted");
                self.settled = true;
                self.bar.finish();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.settled { (0, Some(0)) } else { self.inner.size_hint() }
    }
}

impl<I> Drop for ProgressIter<I> {
    fn drop(&mut self) {
        if self.settled || self.bar.is_closed() {
            return;
        }
        self.settled = true;
        if std::thread::panicking() {
            debug!("ProgressIter::drop: unwinding, marking errored");
            self.bar.fail(PANICKED);
        } else {
            debug!("ProgressIter::drop: abandoned before exhaustion");
            self.bar.stop_early(STOPPED_PREMATURELY);
        }
    }
}

/// Wrap an iterable in a tracker with default settings
///
/// The total comes from the iterator's size hint when it is exact.
#[track_caller]
pub fn wrap<T: IntoIterator>(iterable: T) -> ProgressIter<T::IntoIter> {
    let bar = ProgressBar::builder().build();
    ProgressIter::new(iterable.into_iter(), bar)
}

impl ProgressBar {
    /// Drive this tracker by iterating `iterable`
    pub fn wrap<T: IntoIterator>(self, iterable: T) -> ProgressIter<T::IntoIter> {
        ProgressIter::new(iterable.into_iter(), self)
    }
}

/// `.progress()` on any iterator
pub trait ProgressIterExt: Iterator + Sized {
    #[track_caller]
    fn progress(self) -> ProgressIter<Self> {
        ProgressIter::new(self, ProgressBar::builder().build())
    }

    fn progress_with(self, bar: ProgressBar) -> ProgressIter<Self> {
        ProgressIter::new(self, bar)
    }
}

impl<I: Iterator> ProgressIterExt for I {}
