//! Page fetcher: the HTTP GET behind each poll.

use std::time::Duration;

use anyhow::{Context, Result};
use coordination::escalation::ErrorCategory;
use tracing::{debug, warn};

/// Why a fetch produced no page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {}s: {message}", .timeout.as_secs())]
    Timeout {
        url: String,
        timeout: Duration,
        message: String,
    },

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// Ledger category for this failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Network { .. } | Self::Status { .. } => ErrorCategory::Network,
        }
    }
}

/// Source of raw page content.
///
/// `HttpFetcher` implements this for real HTTP. Tests provide canned pages.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP fetcher with a hard per-request deadline.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, timeout })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                    message: e.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self.client.get(url).send().map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Notice page returned an error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // The body read is covered by the same deadline.
        let body = response.text().map_err(classify)?;
        debug!(%url, bytes = body.len(), "Fetched notice page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let timeout = FetchError::Timeout {
            url: "https://x".into(),
            timeout: Duration::from_secs(10),
            message: "operation timed out".into(),
        };
        assert_eq!(timeout.category(), ErrorCategory::Timeout);
        assert!(timeout.to_string().contains("after 10s"));

        let status = FetchError::Status {
            url: "https://x".into(),
            status: 503,
        };
        assert_eq!(status.category(), ErrorCategory::Network);
        assert_eq!(status.to_string(), "HTTP 503 from https://x");
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        let fetcher = HttpFetcher::new("test-agent", Duration::from_secs(2)).unwrap();
        // Port 9 on localhost (discard) is closed on test machines.
        let err = fetcher.fetch("http://127.0.0.1:9/notice").unwrap_err();
        assert!(matches!(
            err.category(),
            ErrorCategory::Network | ErrorCategory::Timeout
        ));
    }
}
