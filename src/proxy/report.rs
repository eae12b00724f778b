//! Progress reporting interface between the checker and its observers

use crate::proxy::models::{ProbeOutcome, ValidEntry};
use std::collections::HashSet;
use std::time::Duration;

/// Snapshot handed to a [`Reporter`] after each completed probe
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    /// Probe whose completion triggered this report; `None` on the final one
    pub outcome: Option<&'a ProbeOutcome>,
    pub valid: &'a HashSet<ValidEntry>,
    pub invalid: &'a HashSet<String>,
    /// Valid proxies per second since the run started
    pub rate: f64,
    pub elapsed: Duration,
}

impl Report<'_> {
    pub fn is_final(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn checked(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }
}

/// Observer of run progress.
///
/// The checker never calls `report` concurrently, so implementations need
/// no synchronization of their own.
///
/// Reports borrow the result store's sets and are delivered while the store
/// is locked. Reporters must not call back into the store, and should return
/// quickly: every check that finishes meanwhile blocks its runtime thread
/// until `report` returns. Move slow work (blocking writes, network calls)
/// off to another task and hand it owned data.
pub trait Reporter {
    fn report(&mut self, report: &Report<'_>);
}

impl<F> Reporter for F
where
    F: FnMut(&Report<'_>),
{
    fn report(&mut self, report: &Report<'_>) {
        self(report)
    }
}

/// Reporter that drops every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&mut self, _report: &Report<'_>) {}
}
