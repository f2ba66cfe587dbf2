//! Harness reporting
//!
//! ## HarnessReporter Trait
//!
//! The controller reports through [`HarnessReporter`] so output format is kept
//! apart from execution. [`LogReporter`] is the default and writes through
//! `tracing`, which makes `--log` control its verbosity like every other
//! diagnostic.

use std::time::Duration;

use crate::evaluate::Verdict;
use crate::registry::TestCase;

/// Totals for one harness run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Trait for reporting harness progress.
pub trait HarnessReporter {
    /// Called once the selection has been validated
    fn on_run_start(&mut self, _selected: usize) {}

    /// Called after each case has been evaluated
    fn on_case_complete(&mut self, index: usize, case: &TestCase, verdict: &Verdict);

    /// Called when every selected case has run
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// Default reporter: status lines through the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct LogReporter;

impl LogReporter {
    pub fn new() -> Self {
        Self
    }
}

impl HarnessReporter for LogReporter {
    fn on_run_start(&mut self, selected: usize) {
        tracing::debug!("running {} case(s)", selected);
    }

    fn on_case_complete(&mut self, index: usize, case: &TestCase, verdict: &Verdict) {
        tracing::info!("{}", status_line(index, case, verdict));
        for failure in &verdict.failures {
            tracing::debug!("  {}", failure);
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        tracing::info!("FAILED:{:>3}", summary.failed);
        tracing::info!("PASSED:{:>3}", summary.passed);
        tracing::debug!("finished in {:.2}s", summary.duration.as_secs_f64());

        if summary.all_passed() {
            tracing::info!("TEST PASSED!");
        } else {
            tracing::error!("TEST FAILED!");
            tracing::error!("Run again with '--log DEBUG' for more info about failures.");
        }
    }
}

/// `Test[ i]:<label padded to 50> PASS|FAIL`
pub fn status_line(index: usize, case: &TestCase, verdict: &Verdict) -> String {
    format!("Test[{:>2}]:{:<50} {}", index, case.label, verdict.status())
}
