//! Proxy module for validating proxies
//!
//! This module provides functionality for:
//! - Probing a single proxy against an IP echo endpoint
//! - Checking many proxies concurrently with ordered progress reports
//! - Collecting valid and invalid proxies and appending valid ones to a list
//! - Fetching candidate proxy lists from URLs or files

pub mod checker;
pub mod fetcher;
pub mod models;
pub mod probe;
pub mod report;
pub mod store;

pub use checker::{CheckerConfig, ProxyChecker};
pub use fetcher::{FetcherConfig, ProxyFetcher};
pub use models::{ProbeOutcome, ProbeStatus, RunSummary, TransportError, ValidEntry};
pub use probe::{HttpProbe, Probe};
pub use report::{NoopReporter, Report, Reporter};
pub use store::ResultStore;
