//! Single-request validation of one proxy candidate

use crate::proxy::models::{ProbeOutcome, TransportError};
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy, StatusCode};
use std::time::{Duration, Instant};
use tracing::debug;

/// One network round trip through a candidate proxy.
///
/// Implementations must never fail: every error is folded into the
/// returned [`ProbeOutcome`].
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    async fn probe(&self, proxy: &str) -> ProbeOutcome;
}

/// Probe issuing a GET to an IP echo endpoint through the candidate
#[derive(Debug, Clone)]
pub struct HttpProbe {
    test_url: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(test_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            test_url: test_url.into(),
            timeout,
        }
    }

    pub fn test_url(&self) -> &str {
        &self.test_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create a reqwest client routing both http and https through the proxy
    fn create_client(&self, proxy: &str) -> Result<Client, TransportError> {
        let reqwest_proxy = ReqwestProxy::all(proxy)
            .map_err(|e| TransportError::InvalidProxy(e.to_string()))?;

        Client::builder()
            .proxy(reqwest_proxy)
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))
    }

    async fn send(&self, proxy: &str) -> Result<StatusCode, TransportError> {
        let client = self.create_client(proxy)?;

        match tokio::time::timeout(self.timeout, client.get(&self.test_url).send()).await {
            Ok(Ok(response)) => Ok(response.status()),
            Ok(Err(e)) => Err(TransportError::from(e)),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, proxy: &str) -> ProbeOutcome {
        let start = Instant::now();
        let result = self.send(proxy).await;
        let elapsed = start.elapsed();

        let outcome = match result {
            Ok(status) if status == StatusCode::OK => ProbeOutcome::success(proxy.to_string(), elapsed),
            Ok(status) => ProbeOutcome::bad_status(proxy.to_string(), status.as_u16(), elapsed),
            Err(e) => ProbeOutcome::error(proxy.to_string(), e, elapsed),
        };

        debug!(proxy, status = ?outcome.status, elapsed_ms = elapsed.as_millis() as u64, "probe finished");
        outcome
    }
}
