//! Page fetching.
//!
//! The extractors never talk to the network directly; they take a [`Fetch`]
//! capability. Fetches issued by the comment pipeline are strictly
//! sequential (each page's content decides whether and what to fetch
//! next), so the trait exposes a single awaitable method and nothing for
//! batching. A fetch failure propagates as-is; the core never retries.

use crate::Result;

/// Abstract HTTP GET over the Hacker News frontend.
///
/// Implemented by [`HttpFetcher`] for production use; tests substitute a
/// map of canned pages. Callers cancel by dropping the awaited pipeline,
/// which abandons in-flight and pending fetches.
pub trait Fetch {
    /// Fetches the text of the page at `url`.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Palaver/0.3; +https://github.com/palaver-hq/palaver)".to_string(),
        }
    }
}

#[cfg(feature = "fetch")]
pub use http::HttpFetcher;

#[cfg(feature = "fetch")]
mod http {
    use std::time::Duration;

    use url::Url;

    use super::{Fetch, FetchConfig};
    use crate::{PalaverError, Result};

    /// reqwest-backed [`Fetch`] implementation.
    ///
    /// Follows redirects and uses a browser-like Accept header; HN serves
    /// slightly different markup to clients it does not recognize.
    pub struct HttpFetcher {
        client: reqwest::Client,
        config: FetchConfig,
    }

    impl HttpFetcher {
        pub fn new(config: FetchConfig) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout))
                .build()
                .map_err(PalaverError::Http)?;
            Ok(Self { client, config })
        }
    }

    impl Fetch for HttpFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            let parsed = Url::parse(url).map_err(|e| PalaverError::InvalidUrl(e.to_string()))?;

            let response = self
                .client
                .get(parsed)
                .header("User-Agent", &self.config.user_agent)
                .header(
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header("Accept-Language", "en-US,en;q=0.9")
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        PalaverError::Timeout { timeout: self.config.timeout }
                    } else {
                        PalaverError::Http(e)
                    }
                })?;

            Ok(response.text().await?)
        }
    }
}
