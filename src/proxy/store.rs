//! Thread-safe accumulation of probe results

use crate::error::CheckError;
use crate::proxy::models::ValidEntry;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Sets {
    /// Bumped by every reset; writes tagged with an older run are dropped
    run: u64,
    valid: HashSet<ValidEntry>,
    invalid: HashSet<String>,
}

/// Valid and invalid proxies seen during a run.
///
/// Every mutation, including the append to the durable list, happens under
/// one lock so concurrent writers never interleave lines.
#[derive(Debug)]
pub struct ResultStore {
    sets: Mutex<Sets>,
    /// Append-only list of validated proxies, one per line
    output_path: Option<PathBuf>,
}

impl ResultStore {
    /// Create a store that appends validated proxies to `output_path`
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            sets: Mutex::new(Sets::default()),
            output_path: Some(output_path.into()),
        }
    }

    /// Create a store that keeps results in memory only
    pub fn in_memory() -> Self {
        Self {
            sets: Mutex::new(Sets::default()),
            output_path: None,
        }
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    // The sets stay consistent even if a holder panicked, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Sets> {
        self.sets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Empty both sets before a run and return the new run id
    pub fn reset(&self) -> u64 {
        let mut sets = self.lock();
        sets.valid.clear();
        sets.invalid.clear();
        sets.run += 1;
        sets.run
    }

    /// Record a validated proxy and append it to the durable list.
    ///
    /// Returns whether the (proxy, response time) pair was new. Nothing is
    /// recorded if the append fails.
    pub fn record_success(&self, proxy: &str, response_time: Duration) -> Result<bool, CheckError> {
        self.insert_valid(None, proxy, response_time)
    }

    /// Record a failed proxy. Returns whether it was new.
    pub fn record_failure(&self, proxy: &str) -> bool {
        self.insert_invalid(None, proxy)
    }

    /// Like [`record_success`](Self::record_success), but a no-op unless
    /// `run` is still the current run.
    pub fn record_success_for(
        &self,
        run: u64,
        proxy: &str,
        response_time: Duration,
    ) -> Result<bool, CheckError> {
        self.insert_valid(Some(run), proxy, response_time)
    }

    /// Like [`record_failure`](Self::record_failure), but a no-op unless
    /// `run` is still the current run.
    pub fn record_failure_for(&self, run: u64, proxy: &str) -> bool {
        self.insert_invalid(Some(run), proxy)
    }

    fn insert_valid(
        &self,
        run: Option<u64>,
        proxy: &str,
        response_time: Duration,
    ) -> Result<bool, CheckError> {
        let mut sets = self.lock();
        if matches!(run, Some(run) if run != sets.run) {
            return Ok(false);
        }

        if let Some(path) = &self.output_path {
            append_line(path, proxy).map_err(|source| CheckError::Persist {
                path: path.clone(),
                source,
            })?;
        }

        Ok(sets
            .valid
            .insert(ValidEntry::new(proxy.to_string(), response_time)))
    }

    fn insert_invalid(&self, run: Option<u64>, proxy: &str) -> bool {
        let mut sets = self.lock();
        if matches!(run, Some(run) if run != sets.run) {
            return false;
        }
        sets.invalid.insert(proxy.to_string())
    }

    pub fn valid_count(&self) -> usize {
        self.lock().valid.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.lock().invalid.len()
    }

    /// Valid proxies per second, or 0 when no time has elapsed
    pub fn current_rate(&self, elapsed_secs: f64) -> f64 {
        rate(self.valid_count(), elapsed_secs)
    }

    /// Run `f` against a consistent view of both sets
    pub fn with_sets<R>(
        &self,
        f: impl FnOnce(&HashSet<ValidEntry>, &HashSet<String>) -> R,
    ) -> R {
        let sets = self.lock();
        f(&sets.valid, &sets.invalid)
    }

    /// Owned copy of both sets
    pub fn snapshot(&self) -> (HashSet<ValidEntry>, HashSet<String>) {
        self.with_sets(|valid, invalid| (valid.clone(), invalid.clone()))
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

pub(crate) fn rate(valid: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        valid as f64 / elapsed_secs
    } else {
        0.0
    }
}

fn append_line(path: &Path, proxy: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format!("{}\n", proxy.trim()).as_bytes())?;
    file.flush()
}
