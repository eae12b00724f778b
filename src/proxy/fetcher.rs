//! Proxy list acquisition from remote URLs and local files

use crate::Result;
use anyhow::{bail, Context};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default timeout for list downloads in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for list downloads
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Free HTTP proxy list in `protocol://ip:port` format
pub const DEFAULT_SOURCE_URL: &str = "https://api.proxyscrape.com/v3/free-proxy-list/get?request=displayproxies&protocol=http&proxy_format=protocolipport&format=text&timeout=30000";

/// Configuration for proxy fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Downloads candidate proxy lists
pub struct ProxyFetcher {
    client: Client,
}

impl ProxyFetcher {
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch one proxy per line from `url`. Anything but a 200 is an error.
    pub async fn fetch(&self, url: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Unable to fetch proxies from {}", url))?;

        let status = response.status();
        if status != StatusCode::OK {
            bail!(
                "Unable to fetch proxies from the URL. Status code: {}",
                status.as_u16()
            );
        }

        let content = response.text().await?;
        let proxies = parse_lines(&content);
        info!(url, proxies = proxies.len(), "fetched proxy list");
        Ok(proxies)
    }

    /// Read one proxy per line from a local file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read proxies from {:?}", path))?;
        Ok(parse_lines(&content))
    }
}

/// Split a list into trimmed lines, skipping blanks and `#` comments
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Write proxies to `path`, one per line
pub fn save_to_file<P: AsRef<Path>>(proxies: &[String], path: P) -> Result<()> {
    let mut content = proxies.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn spawn_list_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_line,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}/list.txt", addr)
    }

    #[test]
    fn test_fetcher_config_default() {
        let config = FetcherConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_parse_lines() {
        let content = "http://1.1.1.1:80\r\n\n  http://2.2.2.2:8080  \n# comment\n";
        assert_eq!(
            parse_lines(content),
            vec!["http://1.1.1.1:80".to_string(), "http://2.2.2.2:8080".to_string()]
        );
    }

    #[test]
    fn test_parse_lines_keeps_duplicates() {
        let content = "http://1.1.1.1:80\nhttp://1.1.1.1:80\n";
        assert_eq!(parse_lines(content).len(), 2);
    }

    #[test]
    fn test_from_file_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.txt");
        let proxies = vec!["http://1.1.1.1:80".to_string(), "http://2.2.2.2:80".to_string()];

        save_to_file(&proxies, &path).unwrap();
        assert_eq!(ProxyFetcher::from_file(&path).unwrap(), proxies);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProxyFetcher::from_file(dir.path().join("nope.txt")).is_err());
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let url = spawn_list_server("200 OK", "http://1.1.1.1:80\nhttp://2.2.2.2:80\n").await;
        let fetcher = ProxyFetcher::new().unwrap();

        let proxies = fetcher.fetch(&url).await.unwrap();
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[0], "http://1.1.1.1:80");
    }

    #[tokio::test]
    async fn test_fetch_bad_status() {
        let url = spawn_list_server("404 Not Found", "").await;
        let fetcher = ProxyFetcher::new().unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
