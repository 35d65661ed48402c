//! HTTP fetching with a fixed browser header profile and failure
//! classification.
//!
//! All crawler network traffic goes through the [`Fetch`] trait so the
//! pagination and extraction logic can be exercised against canned markup in
//! tests. The production implementation is [`HttpFetcher`], a thin wrapper
//! over a shared `reqwest::Client`.

use reqwest::{Client, StatusCode, header};
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to every page and article fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Transport-layer failure classification.
///
/// The crawler handles all three variants the same way: log, abandon the
/// current unit of work, keep partial results.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status)
        } else {
            FetchError::Connect(e.to_string())
        }
    }
}

/// A blocking-style single GET returning the raw markup text.
///
/// Implementors issue one request per call; there is no retry at this layer.
pub trait Fetch {
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Production fetcher with the fixed header profile the news portals expect.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with the standard header profile and `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,\
                 image/avif,image/webp,image/apng,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert(
            header::CONNECTION,
            header::HeaderValue::from_static("keep-alive"),
        );
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            header::HeaderValue::from_static("1"),
        );
        headers.insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("max-age=0"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_construction() {
        assert!(HttpFetcher::new(FETCH_TIMEOUT).is_ok());
    }

    #[test]
    fn test_error_messages_name_the_failure() {
        assert_eq!(FetchError::Timeout.to_string(), "request timed out");
        assert_eq!(
            FetchError::Status(StatusCode::NOT_FOUND).to_string(),
            "unexpected HTTP status 404 Not Found"
        );
        assert!(
            FetchError::Connect("dns failure".to_string())
                .to_string()
                .contains("dns failure")
        );
    }
}
