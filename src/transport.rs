//! Beacon transport
//!
//! A beacon is a bodyless GET against the collector; the response body is
//! ignored and only the status class matters. The agent's surface is fully
//! synchronous, so the reqwest client is driven by a private current-thread
//! runtime and every send blocks the calling thread until the status is read
//! or the request fails.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::config::CollectorConfig;
use crate::error::{Error, Result};

/// Transport boundary for delivering a single beacon.
pub trait Transport: Send + Sync {
    /// One delivery attempt, no retries.
    ///
    /// An error means the connection failed or the collector answered with a
    /// non-success status.
    fn send(&self, url: &str) -> Result<()>;
}

/// HTTP transport backed by reqwest
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpTransport {
    /// Build a transport carrying the synthesized device user agent.
    pub fn new(user_agent: &str, config: &CollectorConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| Error::Config(format!("invalid user agent: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("failed to create runtime: {}", e)))?;

        Ok(Self { client, runtime })
    }
}

impl Transport for HttpTransport {
    fn send(&self, url: &str) -> Result<()> {
        self.runtime.block_on(async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(Error::Transport(format!(
                    "collector returned status {}",
                    status
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_with_default_config() {
        assert!(HttpTransport::new("Test (Profile/P Configuration/C; en)", &CollectorConfig::default()).is_ok());
    }

    #[test]
    fn test_transport_rejects_malformed_user_agent() {
        let result = HttpTransport::new("bad\nagent", &CollectorConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_transport_rejects_empty_host() {
        let config = CollectorConfig {
            host: String::new(),
            ..Default::default()
        };
        assert!(HttpTransport::new("agent", &config).is_err());
    }
}
