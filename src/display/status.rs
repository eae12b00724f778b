//! Status sinks fed with aggregate counters after every report

use crossterm::{execute, terminal::SetTitle};
use std::io;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// How often the terminal title is refreshed
const TITLE_REFRESH: Duration = Duration::from_secs(1);

/// Aggregate counters of a run in progress
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub valid: usize,
    pub invalid: usize,
    pub rate: f64,
    pub elapsed: Duration,
}

/// Receiver of aggregate counters, e.g. a window title
pub trait StatusSink {
    fn update(&mut self, stats: RunStats);
}

/// Sink that ignores every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl StatusSink for NoopSink {
    fn update(&mut self, _stats: RunStats) {}
}

/// Terminal title text for the given counters
pub fn title_for(stats: &RunStats) -> String {
    format!(
        "ProxyChecker | Valid: {} | Invalid: {} | RPS: {:.2}",
        stats.valid, stats.invalid, stats.rate
    )
}

/// Background task copying the latest counters into the terminal title
pub struct TitleUpdater {
    stats: watch::Sender<RunStats>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TitleUpdater {
    /// Spawn the refresh task. Must be called inside a tokio runtime.
    pub fn start() -> Self {
        let (stats, mut rx) = watch::channel(RunStats::default());
        let (stop, mut stop_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TITLE_REFRESH);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let title = title_for(&rx.borrow_and_update());
                        if let Err(e) = execute!(io::stdout(), SetTitle(title)) {
                            debug!(error = %e, "failed to set terminal title");
                        }
                    }
                }
            }
        });

        Self {
            stats,
            stop: Some(stop),
            handle,
        }
    }

    /// Latest counters pushed into the updater
    pub fn current(&self) -> RunStats {
        *self.stats.borrow()
    }

    /// Stop refreshing and wait for the task to exit
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

impl StatusSink for TitleUpdater {
    fn update(&mut self, stats: RunStats) {
        self.stats.send_replace(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_for() {
        let stats = RunStats {
            valid: 3,
            invalid: 7,
            rate: 1.23456,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(
            title_for(&stats),
            "ProxyChecker | Valid: 3 | Invalid: 7 | RPS: 1.23"
        );
    }

    #[tokio::test]
    async fn test_title_updater_keeps_latest_stats_and_stops() {
        let mut updater = TitleUpdater::start();
        updater.update(RunStats {
            valid: 1,
            ..Default::default()
        });
        updater.update(RunStats {
            valid: 2,
            invalid: 5,
            ..Default::default()
        });
        assert_eq!(updater.current().valid, 2);
        assert_eq!(updater.current().invalid, 5);

        tokio::time::timeout(Duration::from_secs(2), updater.stop())
            .await
            .unwrap();
    }
}
