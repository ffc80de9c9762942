//! Integration tests for the progress tracker
//!
//! Time and timers are driven by hand so debounce behavior is deterministic.

use std::sync::Arc;
use std::time::Duration;

use progress_bar_plus::tracker::{INTERRUPTED, PANICKED};
use progress_bar_plus::{
    Config, FixedClassifier, Lifecycle, ManualClock, ManualScheduler, MemoryTarget, ProgressBar, ProgressBarBuilder,
    ProgressIterExt, RenderMode,
};
use proptest::prelude::*;

struct Harness {
    clock: Arc<ManualClock>,
    scheduler: Arc<ManualScheduler>,
    target: MemoryTarget,
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new());
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        Self {
            clock,
            scheduler,
            target: MemoryTarget::new(),
        }
    }

    fn builder(&self) -> ProgressBarBuilder {
        ProgressBar::builder()
            .config(Config::default())
            .classifier(Arc::new(FixedClassifier(RenderMode::Redirected)))
            .debounce(Duration::from_millis(100))
            .target(Box::new(self.target.clone()))
            .scheduler(self.scheduler.clone())
            .clock(self.clock.clone())
    }

    fn advance(&self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
    }

    fn last(&self) -> String {
        self.target.last_text().unwrap_or_default()
    }
}

// =============================================================================
// Debounce
// =============================================================================

#[test]
fn test_burst_of_updates_coalesces_into_one_deferred_render() {
    let h = Harness::new();
    let bar = h.builder().total(10).build();

    bar.update(1);
    assert_eq!(bar.render_count(), 1, "first update renders immediately");

    for _ in 0..5 {
        bar.update(1);
    }
    assert_eq!(bar.render_count(), 1);
    assert_eq!(h.scheduler.scheduled_count(), 1);
    assert!(bar.has_pending_render());

    h.advance(50);
    assert_eq!(h.scheduler.run_due(), 0);

    h.advance(50);
    assert_eq!(h.scheduler.run_due(), 1);
    assert_eq!(bar.render_count(), 2);
    assert!(!bar.has_pending_render());
    assert!(h.last().contains("6/10it"), "deferred frame shows latest count: {}", h.last());
}

#[test]
fn test_spaced_updates_render_immediately() {
    let h = Harness::new();
    let bar = h.builder().total(5).build();

    for _ in 0..5 {
        bar.update(1);
        h.advance(150);
    }

    assert_eq!(bar.render_count(), 5);
    assert_eq!(h.scheduler.scheduled_count(), 0);
}

#[test]
fn test_deferred_render_after_close_is_suppressed() {
    let h = Harness::new();
    let bar = h.builder().total(4).build();

    bar.update(1);
    bar.update(1);
    assert_eq!(h.scheduler.pending_count(), 1);

    bar.close();
    let after_close = h.target.len();
    assert!(h.target.frames().last().is_some_and(|f| f.last));

    h.advance(500);
    assert_eq!(h.scheduler.run_due(), 1);
    assert_eq!(h.target.len(), after_close, "no frame after the final one");
}

#[test]
fn test_deferred_render_after_drop_is_harmless() {
    let h = Harness::new();
    let bar = h.builder().total(4).build();
    bar.update(1);
    bar.update(1);
    drop(bar);

    h.advance(500);
    assert_eq!(h.scheduler.run_due(), 1);
}

#[test]
fn test_render_now_ignores_debounce() {
    let h = Harness::new();
    let bar = h.builder().build();
    bar.update(1);
    bar.render_now();
    bar.render_now();
    assert_eq!(bar.render_count(), 3);
    assert_eq!(h.scheduler.scheduled_count(), 0);
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_known_total_shows_percentage_and_counts() {
    let h = Harness::new();
    let bar = h.builder().total(10).description("loading").build();

    for _ in 0..3 {
        bar.update(1);
        h.advance(200);
    }

    let line = h.last();
    assert!(line.contains(" 30.0% |"), "line: {line}");
    assert!(line.contains("3/10it"), "line: {line}");
    assert!(line.ends_with("loading"), "line: {line}");
}

#[test]
fn test_unknown_total_shows_count_only() {
    let h = Harness::new();
    let bar = h.builder().build();

    for _ in 0..5 {
        bar.update(1);
        h.advance(200);
    }

    let line = h.last();
    assert!(line.contains(" 5it "), "line: {line}");
    assert!(!line.contains('%'), "line: {line}");
    assert!(!line.contains('|'), "line: {line}");
}

#[test]
fn test_zero_total_treated_as_unknown() {
    let h = Harness::new();
    let bar = h.builder().total(0).build();
    bar.update(2);
    assert!(!h.last().contains('%'));
    assert!(h.last().contains(" 2it "));
}

#[test]
fn test_default_description_is_call_site() {
    let h = Harness::new();
    let bar = h.builder().build();
    let description = bar.description();
    assert!(description.starts_with("tracker_test.rs:"), "got {description}");
}

#[test]
fn test_set_description_updates_next_frame() {
    let h = Harness::new();
    let bar = h.builder().total(2).description("first").build();
    bar.update(1);
    h.advance(200);
    bar.set_description("second");

    assert_eq!(bar.description(), "second");
    assert!(h.last().ends_with("second"));
}

#[test]
fn test_reset_zeroes_count_and_renders() {
    let h = Harness::new();
    let bar = h.builder().total(10).build();
    bar.update(7);
    let before = bar.render_count();

    bar.reset();

    assert_eq!(bar.count(), 0);
    assert_eq!(bar.render_count(), before + 1);
    assert!(h.last().contains("0/10it"));
    assert_eq!(bar.status(), Lifecycle::Running);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_exhausted_iterator_is_done() {
    let h = Harness::new();
    let bar = h.builder().build();

    let items: Vec<u32> = bar.wrap(vec![1, 2, 3]).collect();

    assert_eq!(items, vec![1, 2, 3]);
    let frames = h.target.frames();
    let last = frames.last().expect("a final frame");
    assert!(last.last);
    assert!(last.payload.as_str().starts_with("(   done    )"));
    assert!(last.payload.as_str().contains("3/3it"));
}

#[test]
fn test_error_in_body_is_recorded_and_returned() {
    let h = Harness::new();
    let bar = h.builder().build();

    let result = bar.wrap(0..10).try_for_each_tracked(|i| {
        if i == 4 {
            return Err(eyre::eyre!("disk full"));
        }
        Ok(())
    });

    let err = result.expect_err("body error propagates");
    assert_eq!(err.to_string(), "disk full");

    let line = h.last();
    assert!(line.starts_with("(   error   )"), "line: {line}");
    assert!(line.ends_with("\ndisk full"), "line: {line}");
    assert!(line.contains("4/10it"), "line: {line}");
}

#[test]
fn test_break_marks_stopped() {
    let h = Harness::new();
    let bar = h.builder().build();

    let mut iter = bar.wrap(0..10);
    for i in iter.by_ref() {
        if i == 3 {
            break;
        }
    }
    assert_eq!(iter.bar().status(), Lifecycle::Running);
    drop(iter);

    let line = h.last();
    assert!(line.starts_with("(  stopped  )"), "line: {line}");
    assert!(line.contains("3/10it"), "line: {line}");
    assert!(h.target.frames().last().is_some_and(|f| f.last));
}

#[test]
fn test_panic_in_body_marks_errored() {
    let h = Harness::new();
    let bar = h.builder().build();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        for i in bar.wrap(0..10) {
            if i == 2 {
                panic!("boom");
            }
        }
    }));

    assert!(result.is_err());
    let line = h.last();
    assert!(line.starts_with("(   error   )"), "line: {line}");
    assert!(line.ends_with(PANICKED), "line: {line}");
}

#[test]
fn test_panic_message_is_kept_by_for_each_tracked() {
    let h = Harness::new();
    let bar = h.builder().build();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        bar.wrap(0..10).for_each_tracked(|i| {
            if i == 2 {
                panic!("boom at {i}");
            }
        });
    }));

    let payload = result.expect_err("panic resumes");
    assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("boom at 2"));
    let line = h.last();
    assert!(line.starts_with("(   error   )"), "line: {line}");
    assert!(line.ends_with("panicked while iterating: boom at 2"), "line: {line}");
    assert!(line.contains("2/10it"), "line: {line}");
}

#[test]
fn test_drop_while_running_is_interrupted() {
    let h = Harness::new();
    let bar = h.builder().total(10).build();
    bar.update(3);
    drop(bar);

    let line = h.last();
    assert!(line.starts_with("(interrupted)"), "line: {line}");
    assert!(line.ends_with(INTERRUPTED), "line: {line}");
}

#[test]
fn test_drop_before_start_is_stopped() {
    let h = Harness::new();
    let bar = h.builder().total(10).build();
    drop(bar);
    assert!(h.last().starts_with("(  stopped  )"));
}

#[test]
fn test_scoped_use_closes_on_exit() {
    let h = Harness::new();
    let bar = h.builder().total(3).build();
    {
        let scoped = bar.enter();
        scoped.update(3);
    }
    assert!(bar.is_closed());
    assert_eq!(bar.status(), Lifecycle::Stopped);
    assert!(h.target.frames().last().is_some_and(|f| f.last));
}

#[test]
fn test_close_twice_only_rerenders() {
    let h = Harness::new();
    let bar = h.builder().total(3).build();
    bar.update(1);
    bar.finish();
    let frames = h.target.len();

    bar.close();

    assert_eq!(bar.status(), Lifecycle::Done);
    assert_eq!(h.target.len(), frames + 1);
}

#[test]
fn test_first_error_wins() {
    let h = Harness::new();
    let bar = h.builder().build();
    bar.update(1);
    bar.fail("first");
    bar.fail("second");
    assert_eq!(bar.status(), Lifecycle::Errored);
    assert_eq!(bar.error_detail().as_deref(), Some("first"));
}

#[test]
fn test_update_after_close_keeps_final_state() {
    let h = Harness::new();
    let bar = h.builder().total(3).build();
    bar.update(3);
    bar.finish();
    let frames = h.target.len();

    bar.update(1);

    assert_eq!(bar.status(), Lifecycle::Done);
    assert_eq!(bar.count(), 4);
    assert_eq!(h.target.len(), frames, "no frames after the final one");
}

#[test]
fn test_progress_extension_uses_exact_size_hint() {
    let iter = (0..7).progress();
    assert_eq!(iter.bar().total(), Some(7));

    let filtered = (0..7).filter(|_| true).progress();
    assert_eq!(filtered.bar().total(), None);

    // Dropped before starting: the adapter closes its tracker
    drop(iter);
    drop(filtered);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_count_is_running_sum(steps in proptest::collection::vec(0u64..1000, 0..40)) {
        let h = Harness::new();
        let bar = h.builder().build();
        let mut expected = 0u64;
        let mut previous = 0u64;
        for n in steps {
            bar.update(n);
            expected += n;
            let count = bar.count();
            prop_assert_eq!(count, expected);
            prop_assert!(count >= previous);
            previous = count;
            h.advance(30);
            h.scheduler.run_due();
        }
        bar.close();
    }
}
