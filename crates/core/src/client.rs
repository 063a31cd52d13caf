//! High-level client API.
//!
//! [`HackerNews`] ties a [`Fetch`] capability to the parsers: listings in,
//! typed stories out; item ids in, fully extracted comment threads out.
//!
//! # Example
//!
//! ```rust,no_run
//! use palaver_core::{HackerNews, PostType};
//!
//! # async fn example() -> palaver_core::Result<()> {
//! let hn = HackerNews::new()?;
//! let front_page = hn.stories(PostType::Top, 1).await?;
//! let story = hn.story_with_comments(front_page[0].id, true).await?;
//! println!("{} comments loaded", story.comments.as_deref().unwrap_or_default().len());
//! # Ok(())
//! # }
//! ```

use crate::comments::load_thread;
use crate::fetch::Fetch;
use crate::item::{Comment, PostType, Story};
use crate::listing::parse_listing;
use crate::urls::{self, listing_url};
use crate::Result;

#[cfg(feature = "fetch")]
use crate::fetch::{FetchConfig, HttpFetcher};

/// Configuration for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Frontend to scrape. Overridable for tests and mirrors.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent for HTTP requests.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let fetch_defaults = crate::fetch::FetchConfig::default();
        Self {
            base_url: urls::BASE_URL.to_string(),
            timeout: fetch_defaults.timeout,
            user_agent: fetch_defaults.user_agent,
        }
    }
}

impl ClientConfig {
    /// Creates a new builder for ClientConfig.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }
}

/// Builder for [`ClientConfig`].
///
/// # Example
///
/// ```rust
/// use palaver_core::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://news.ycombinator.com")
///     .timeout(10)
///     .build();
/// ```
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self { config: ClientConfig::default() }
    }

    /// Sets the frontend base URL.
    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.config.base_url = value.into();
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout(mut self, value: u64) -> Self {
        self.config.timeout = value;
        self
    }

    /// Sets the User-Agent string.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = value.into();
        self
    }

    /// Builds the config.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Hacker News client over an arbitrary [`Fetch`] capability.
pub struct HackerNews<F: Fetch> {
    fetcher: F,
    config: ClientConfig,
}

#[cfg(feature = "fetch")]
impl HackerNews<HttpFetcher> {
    /// Creates a client with default configuration and an HTTP fetcher.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates an HTTP-backed client with the given configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(FetchConfig {
            timeout: config.timeout,
            user_agent: config.user_agent.clone(),
        })?;
        Ok(Self { fetcher, config })
    }
}

impl<F: Fetch> HackerNews<F> {
    /// Creates a client over a caller-supplied fetch capability.
    pub fn with_fetcher(fetcher: F, config: ClientConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches one page of a listing. Pages are 1-based.
    pub async fn stories(&self, kind: PostType, page: u32) -> Result<Vec<Story>> {
        let url = listing_url(&self.config.base_url, kind, page);
        let html = self.fetcher.fetch(&url).await?;
        parse_listing(&html, kind)
    }

    /// Fetches a story and its comment thread.
    ///
    /// `id` may be a comment permalink; it resolves to the owning story.
    /// With `include_all`, paginated threads are loaded in full.
    pub async fn story_with_comments(&self, id: u64, include_all: bool) -> Result<Story> {
        load_thread(&self.fetcher, &self.config.base_url, id, include_all).await
    }

    /// Fetches just the ordered comment sequence of a story.
    pub async fn comments(&self, id: u64, include_all: bool) -> Result<Vec<Comment>> {
        let story = self.story_with_comments(id, include_all).await?;
        Ok(story.comments.unwrap_or_default())
    }

    /// Resolves an item id to the id of its owning story.
    ///
    /// For a story id this is the identity; for a comment permalink it
    /// walks the parent chain.
    pub async fn resolve_story_id(&self, id: u64) -> Result<u64> {
        let story = self.story_with_comments(id, false).await?;
        Ok(story.id)
    }
}
