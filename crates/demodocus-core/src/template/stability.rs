//! Waiting for DOM stability (§4.2 "Waiting for stability").
//!
//! Repeatedly snapshots the DOM at a fixed interval until the string has
//! been unchanged for a continuous window of at least `threshold`, or
//! `timeout` elapses. On timeout, the accumulated per-snapshot templates
//! are folded into one (a degenerate form of the original's backwards
//! animation-cycle detection: instead of walking the history looking for a
//! repeating changing-element set, every distinct snapshot seen is merged,
//! which converges to the same union of unstable xpaths).

use super::HtmlTemplate;
use std::time::{Duration, Instant};

/// Anything that can hand back a fresh DOM snapshot string. Implemented by
/// `InterfaceAccess`-backed callers; kept as a narrow trait so the template
/// engine doesn't depend on the interface contract.
pub trait SnapshotSource {
    /// Produce a new snapshot of the current page.
    fn snapshot(&mut self) -> crate::error::Result<String>;
}

/// Default parameters grounded in the original implementation's
/// `mode_web` configuration (§4.2).
pub const PAGE_CHANGE_NUM_LOADS: u32 = 10;
/// Default stability threshold, in seconds.
pub const PAGE_CHANGE_THRESHOLD_SECS: u64 = 8;
/// Default stability timeout, in seconds.
pub const PAGE_CHANGE_TIMEOUT_SECS: u64 = 20;

/// Outcome of a stability wait.
pub struct StabilityResult {
    /// Total time spent waiting.
    pub stable_time: Duration,
    /// Whether the page was observed stable before `timeout`.
    pub stable: bool,
    /// The merged template over every distinct snapshot observed.
    pub template: HtmlTemplate,
}

/// Poll `source` at `interval` until stable for `threshold`, bounded by
/// `timeout`. Always returns (never blocks past `timeout`).
pub fn wait_for_stability(
    source: &mut dyn SnapshotSource,
    interval: Duration,
    threshold: Duration,
    timeout: Duration,
) -> crate::error::Result<StabilityResult> {
    let start = Instant::now();
    let first = source.snapshot()?;
    let mut template = HtmlTemplate::from_html(&first);
    let mut last_snapshot = first;
    let mut unchanged_since = Instant::now();

    loop {
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok(StabilityResult {
                stable_time: elapsed,
                stable: false,
                template,
            });
        }
        if unchanged_since.elapsed() >= threshold {
            return Ok(StabilityResult {
                stable_time: start.elapsed(),
                stable: true,
                template,
            });
        }

        if !interval.is_zero() {
            std::thread::sleep(interval.min(timeout.saturating_sub(start.elapsed())));
        }

        let snapshot = source.snapshot()?;
        if snapshot == last_snapshot {
            continue;
        }
        template.add_html(&snapshot);
        last_snapshot = snapshot;
        unchanged_since = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(String);
    impl SnapshotSource for Constant {
        fn snapshot(&mut self) -> crate::error::Result<String> {
            Ok(self.0.clone())
        }
    }

    struct Sequence {
        pages: Vec<String>,
        idx: usize,
    }
    impl SnapshotSource for Sequence {
        fn snapshot(&mut self) -> crate::error::Result<String> {
            let page = self.pages[self.idx.min(self.pages.len() - 1)].clone();
            self.idx += 1;
            Ok(page)
        }
    }

    #[test]
    fn constant_page_stabilizes_quickly() {
        let mut src = Constant("<html><body><p>hi</p></body></html>".to_string());
        let result = wait_for_stability(
            &mut src,
            Duration::from_millis(0),
            Duration::from_millis(5),
            Duration::from_millis(200),
        )
        .unwrap();
        assert!(result.stable);
        assert!(result.template.matches_html("<html><body><p>hi</p></body></html>"));
    }

    #[test]
    fn changing_page_times_out_with_merged_template() {
        let mut src = Sequence {
            pages: vec![
                "<html><body><time>1</time></body></html>".to_string(),
                "<html><body><time>2</time></body></html>".to_string(),
                "<html><body><time>3</time></body></html>".to_string(),
                "<html><body><time>4</time></body></html>".to_string(),
            ],
            idx: 0,
        };
        let result = wait_for_stability(
            &mut src,
            Duration::from_millis(1),
            Duration::from_secs(10),
            Duration::from_millis(20),
        )
        .unwrap();
        assert!(!result.stable);
        assert!(result.template.matches_html("<html><body><time>99</time></body></html>"));
    }
}
