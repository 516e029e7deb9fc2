//! Fetch a URL and count a word in its body.
//!
//! This is the concrete [`ItemProcessor`] the CLI plugs into the dispatcher.

use crate::concurrent::ItemProcessor;
use crate::error::ScanError;
use crate::types::ScanConfig;
use std::future::Future;
use std::time::Duration;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("fanscan/", env!("CARGO_PKG_VERSION"));

/// Count non-overlapping, case-sensitive occurrences of `needle` in
/// `haystack`. An empty needle counts as zero.
pub fn count_occurrences(haystack: &str, needle: &str) -> u64 {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count() as u64
}

/// Issues one GET per URL and counts the query word in the response body.
///
/// The status code is not inspected: whatever body the server returns is
/// counted.
#[derive(Debug, Clone)]
pub struct WordCounter {
    http_client: reqwest::Client,
    query: String,
    timeout: Duration,
}

impl WordCounter {
    /// Build a counter from a validated configuration.
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ScanError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            query: config.query.clone(),
            timeout: config.timeout,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Fetch `url` and return how often the query occurs in its body.
    pub async fn count_in(&self, url: &str) -> Result<u64, ScanError> {
        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScanError::timeout(format!("GET {}", url), Some(self.timeout))
            } else {
                e.into()
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ScanError::HttpError {
            message: format!("Failed to read body of {}: {}", url, e),
            status_code: Some(status.as_u16()),
        })?;

        let count = count_occurrences(&body, &self.query);
        tracing::debug!(url, status = status.as_u16(), bytes = body.len(), count, "page scanned");
        Ok(count)
    }
}

impl ItemProcessor<String> for WordCounter {
    type Error = ScanError;

    fn process(&self, item: &String) -> impl Future<Output = Result<u64, ScanError>> + Send {
        self.count_in(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `body` with `status` to every connection, forever.
    async fn serve(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_count_occurrences() {
        assert_eq!(count_occurrences("Go Go Gopher", "Go"), 3);
        assert_eq!(count_occurrences("go GO gO", "Go"), 0);
        assert_eq!(count_occurrences("aaaa", "aa"), 2);
        assert_eq!(count_occurrences("anything", ""), 0);
        assert_eq!(count_occurrences("", "Go"), 0);
    }

    #[test]
    fn test_new_rejects_empty_query() {
        let config = ScanConfig::default().with_query("");
        assert!(WordCounter::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_counts_word_in_body() {
        let url = serve("200 OK", "Go is fun. Let's Go!").await;
        let counter = WordCounter::new(&ScanConfig::default()).unwrap();
        assert_eq!(counter.count_in(&url).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_error_status_body_is_still_counted() {
        let url = serve("404 Not Found", "Go away").await;
        let counter = WordCounter::new(&ScanConfig::default()).unwrap();
        assert_eq!(counter.process(&url).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let counter = WordCounter::new(&ScanConfig::default()).unwrap();
        let err = counter
            .count_in(&format!("http://{}/", addr))
            .await
            .unwrap_err();
        assert!(!err.is_setup_error());
    }

    #[tokio::test]
    async fn test_malformed_url_is_an_error() {
        let counter = WordCounter::new(&ScanConfig::default()).unwrap();
        let err = counter.count_in("not a url").await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl { .. }));
    }
}
