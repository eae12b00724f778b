//! Proxy checker: bounded concurrent probing with ordered progress reports

use crate::error::CheckError;
use crate::proxy::models::{ProbeOutcome, ProbeStatus, RunSummary, TransportError};
use crate::proxy::probe::{HttpProbe, Probe};
use crate::proxy::report::{Report, Reporter};
use crate::proxy::store::{self, ResultStore};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// Default timeout for a single probe in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of concurrent probes
pub const DEFAULT_WORKERS: usize = 10;

/// Default URL to probe through each proxy
pub const DEFAULT_TEST_URL: &str = "https://httpbin.org/ip";

/// Default append-only list of validated proxies
pub const DEFAULT_OUTPUT_PATH: &str = "valid/valid_proxies.txt";

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each probe
    pub timeout: Duration,
    /// Maximum number of probes in flight
    pub workers: usize,
    /// URL requested through every proxy
    pub test_url: String,
    /// Where validated proxies are appended, if anywhere
    pub output_path: Option<PathBuf>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            workers: DEFAULT_WORKERS,
            test_url: DEFAULT_TEST_URL.to_string(),
            output_path: Some(PathBuf::from(DEFAULT_OUTPUT_PATH)),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the worker count; zero is treated as one
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Keep validated proxies in memory only
    pub fn without_output(mut self) -> Self {
        self.output_path = None;
        self
    }
}

/// Concurrent proxy checker.
///
/// Each run probes every candidate on its own task while a semaphore keeps
/// at most `workers` probes in flight. Results are recorded into the shared
/// [`ResultStore`] as they finish; the reporter sees them in submission order.
pub struct ProxyChecker<P: Probe = HttpProbe> {
    config: CheckerConfig,
    probe: Arc<P>,
    store: Arc<ResultStore>,
}

impl ProxyChecker<HttpProbe> {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        let probe = HttpProbe::new(config.test_url.clone(), config.timeout);
        Self::with_probe(config, probe)
    }
}

impl Default for ProxyChecker<HttpProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Probe> ProxyChecker<P> {
    /// Create a checker driven by a custom probe
    pub fn with_probe(config: CheckerConfig, probe: P) -> Self {
        let store = match &config.output_path {
            Some(path) => ResultStore::new(path.clone()),
            None => ResultStore::in_memory(),
        };

        Self {
            config,
            probe: Arc::new(probe),
            store: Arc::new(store),
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Probe every proxy and report progress.
    ///
    /// `reporter` is called once per candidate, in the order the candidates
    /// were given, and once more after the last one. Probe failures are
    /// recorded as invalid proxies; only a failed append to the durable
    /// list aborts the run.
    ///
    /// Dropping the returned future cancels every check still queued or in
    /// flight, and nothing they finish is recorded once the next run starts.
    pub async fn check_proxies<I, S, R>(
        &self,
        proxies: I,
        reporter: &mut R,
    ) -> Result<RunSummary, CheckError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        R: Reporter + ?Sized,
    {
        let proxies: Vec<String> = proxies
            .into_iter()
            .map(|p| p.into().trim().to_string())
            .collect();
        let workers = self.config.workers.max(1);

        let run = self.store.reset();
        let start = Instant::now();
        info!(proxies = proxies.len(), workers, "starting proxy checks");

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut handles: Vec<AbortOnDrop<Result<ProbeOutcome, CheckError>>> = proxies
            .iter()
            .map(|proxy| {
                let sem = Arc::clone(&semaphore);
                let probe = Arc::clone(&self.probe);
                let store = Arc::clone(&self.store);
                let proxy = proxy.clone();
                AbortOnDrop(tokio::spawn(async move {
                    // The semaphore is owned by this run and never closed.
                    let _permit = sem.acquire().await.expect("Semaphore closed unexpectedly");
                    let outcome = probe.probe(&proxy).await;
                    record(&store, run, &outcome)?;
                    Ok(outcome)
                }))
            })
            .collect();

        for index in 0..handles.len() {
            let outcome = match (&mut handles[index]).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    // Remaining tasks are aborted as `handles` drops.
                    error!(proxy = %proxies[index], error = %e, "aborting run");
                    return Err(e);
                }
                Err(e) => {
                    warn!(proxy = %proxies[index], error = %e, "probe task failed");
                    self.store.record_failure_for(run, &proxies[index]);
                    ProbeOutcome::error(
                        proxies[index].clone(),
                        TransportError::Other(e.to_string()),
                        Duration::ZERO,
                    )
                }
            };
            self.emit(reporter, start, Some(&outcome));
        }

        let (rate, elapsed) = self.emit(reporter, start, None);
        let (valid, invalid) = self.store.snapshot();
        info!(
            valid = valid.len(),
            invalid = invalid.len(),
            rate,
            elapsed_secs = elapsed.as_secs_f64(),
            "proxy checks finished"
        );

        Ok(RunSummary {
            valid,
            invalid,
            rate,
            elapsed,
        })
    }

    fn emit<R: Reporter + ?Sized>(
        &self,
        reporter: &mut R,
        start: Instant,
        outcome: Option<&ProbeOutcome>,
    ) -> (f64, Duration) {
        let elapsed = start.elapsed();
        self.store.with_sets(|valid, invalid| {
            let rate = store::rate(valid.len(), elapsed.as_secs_f64());
            reporter.report(&Report {
                outcome,
                valid,
                invalid,
                rate,
                elapsed,
            });
            (rate, elapsed)
        })
    }
}

fn record(store: &ResultStore, run: u64, outcome: &ProbeOutcome) -> Result<(), CheckError> {
    match outcome.status {
        ProbeStatus::Success => store
            .record_success_for(run, &outcome.proxy, outcome.elapsed)
            .map(|_| ()),
        ProbeStatus::BadStatus(_) | ProbeStatus::Error(_) => {
            store.record_failure_for(run, &outcome.proxy);
            Ok(())
        }
    }
}

/// Join handle that aborts its task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().0).poll(cx)
    }
}
