//! Error types for Palaver operations.
//!
//! This module defines the main error type [`PalaverError`] which represents
//! all possible errors that can occur while fetching Hacker News pages and
//! reconstructing stories and comment threads from their markup.
//!
//! # Example
//!
//! ```rust
//! use palaver_core::{PalaverError, Result};
//!
//! fn story_id(row_id: &str) -> Result<u64> {
//!     row_id
//!         .parse()
//!         .map_err(|_| PalaverError::StructuralParse(format!("bad story row id: {row_id}")))
//! }
//! ```

use thiserror::Error;

/// Main error type for scraping and thread-extraction operations.
///
/// Parse errors abort the specific extraction call and are returned to the
/// caller; they never corrupt previously returned data. A single malformed
/// *comment* row is not an error (the row is dropped), but a malformed story
/// header always is.
#[derive(Error, Debug)]
pub enum PalaverError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems. Never retried inside the core.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided to the fetcher.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A required structural anchor is missing or unparsable.
    ///
    /// Raised when a story row has no parsable id, a title anchor is absent,
    /// or an item page lacks the expected header table. Fatal for the
    /// enclosing story or page; no partial `Story` is produced.
    #[error("Markup is missing a required structural anchor: {0}")]
    StructuralParse(String),

    /// Comment-permalink resolution failed.
    ///
    /// The parent-chain walk exceeded its hop bound, or the resolved story's
    /// comment set does not contain the originally requested id.
    #[error("Could not resolve comment permalink: {0}")]
    PermalinkResolution(String),

    /// A CSS selector failed to compile.
    ///
    /// The selectors used by the extractors are fixed strings, so this
    /// indicates a programming error rather than bad input markup.
    #[error("Failed to parse HTML: {0}")]
    HtmlParse(String),
}

/// Result type alias for PalaverError.
///
/// This is a convenience alias for `std::result::Result<T, PalaverError>`.
pub type Result<T> = std::result::Result<T, PalaverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PalaverError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_structural_parse_error() {
        let err = PalaverError::StructuralParse("story row has no id".to_string());
        assert!(err.to_string().contains("story row has no id"));
    }

    #[test]
    fn test_timeout_error() {
        let err = PalaverError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
