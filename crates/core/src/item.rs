//! Domain model for scraped Hacker News content.
//!
//! All values in this module are created by the parsers in
//! [`crate::listing`] and [`crate::comments`]; nothing else constructs
//! them from scratch. After construction the mutation domains are
//! disjoint: the visibility engine touches only [`Comment::visibility`],
//! the rich-text renderer populates only the lazy render cache, and vote
//! state belongs to an external voting collaborator.

use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use serde::Serialize;

use crate::richtext::{self, StyledText};

/// The listing a story was scraped from.
///
/// Doubles as the path segment of the listing endpoint, see
/// [`PostType::as_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Top,
    New,
    Best,
    Ask,
    Show,
    Jobs,
    Active,
}

impl PostType {
    /// Path segment of the listing endpoint for this post type.
    pub fn as_path(self) -> &'static str {
        match self {
            PostType::Top => "news",
            PostType::New => "newest",
            PostType::Best => "best",
            PostType::Ask => "ask",
            PostType::Show => "show",
            PostType::Jobs => "jobs",
            PostType::Active => "active",
        }
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" | "news" | "hot" => Ok(PostType::Top),
            "new" | "newest" => Ok(PostType::New),
            "best" => Ok(PostType::Best),
            "ask" => Ok(PostType::Ask),
            "show" => Ok(PostType::Show),
            "jobs" => Ok(PostType::Jobs),
            "active" => Ok(PostType::Active),
            _ => Err(format!(
                "Invalid listing: {s}. Valid options: top, new, best, ask, show, jobs, active"
            )),
        }
    }
}

/// Vote-control URLs derived from markup.
///
/// Their presence or absence signals current vote state: a user who has not
/// voted sees an upvote link and no unvote link; a voted user the reverse.
/// The server sometimes hides the control entirely, leaving both absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct VoteLinks {
    pub upvote: Option<String>,
    pub unvote: Option<String>,
}

/// Per-comment render state over the flat thread sequence.
///
/// `Compact` is the collapsed root of a hidden subtree: the row is still
/// shown (with a collapse indicator) but its body and descendants are not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Compact,
    Hidden,
}

/// A submitted item: link post, text post, or job.
///
/// Identity is `id` alone. Score and vote state are mutable by the
/// (external) voting collaborator, so equality and hashing must not
/// involve them.
#[derive(Debug, Clone, Serialize)]
pub struct Story {
    pub id: u64,
    pub url: String,
    pub title: String,
    pub author: String,
    /// Server-formatted age ("3 hours ago"). Opaque; never parsed.
    pub age_label: String,
    pub score: u32,
    pub comment_count: u32,
    pub post_type: PostType,
    pub upvoted: bool,
    pub vote_links: VoteLinks,
    /// Inline body of text posts (Ask HN and similar), as raw HTML.
    pub body_text: Option<String>,
    /// Comment thread, populated lazily by the comment extractor.
    pub comments: Option<Vec<Comment>>,
}

impl PartialEq for Story {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Story {}

impl Hash for Story {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One comment row of a thread.
///
/// Comments are stored as a single flat sequence in pre-order tree
/// traversal: the descendants of a comment are exactly the maximal
/// contiguous run immediately following it whose `level` is strictly
/// greater than its own. `level` is derived from the rendered indentation
/// spacer, not from parent pointers.
#[derive(Debug, Serialize)]
pub struct Comment {
    /// Unique within a story's thread. Negative ids are reserved for the
    /// synthetic top comment built from a story's inline body text.
    pub id: i64,
    pub author: String,
    pub age_label: String,
    /// Nesting depth, spacer width / 40.
    pub level: u32,
    /// Raw HTML body, reply control already erased.
    pub text: String,
    pub upvoted: bool,
    pub vote_links: VoteLinks,
    pub visibility: Visibility,
    #[serde(skip)]
    rendered: OnceLock<StyledText>,
}

impl Comment {
    pub fn new(
        id: i64,
        author: String,
        age_label: String,
        level: u32,
        text: String,
        upvoted: bool,
        vote_links: VoteLinks,
    ) -> Self {
        Self {
            id,
            author,
            age_label,
            level,
            text,
            upvoted,
            vote_links,
            visibility: Visibility::Visible,
            rendered: OnceLock::new(),
        }
    }

    /// Rich-text projection of `text`, rendered on first access.
    ///
    /// `text` is immutable after construction, so the cache is never
    /// invalidated.
    pub fn rendered_text(&self) -> &StyledText {
        self.rendered.get_or_init(|| richtext::render(&self.text))
    }
}

impl Clone for Comment {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            author: self.author.clone(),
            age_label: self.age_label.clone(),
            level: self.level,
            text: self.text.clone(),
            upvoted: self.upvoted,
            vote_links: self.vote_links.clone(),
            visibility: self.visibility,
            rendered: self.rendered.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn story(id: u64, score: u32, upvoted: bool) -> Story {
        Story {
            id,
            url: "https://example.com".to_string(),
            title: "A story".to_string(),
            author: "pg".to_string(),
            age_label: "1 hour ago".to_string(),
            score,
            comment_count: 0,
            post_type: PostType::Top,
            upvoted,
            vote_links: VoteLinks::default(),
            body_text: None,
            comments: None,
        }
    }

    #[test]
    fn test_story_identity_is_id_only() {
        let fresh = story(8863, 10, false);
        let voted = story(8863, 11, true);
        assert_eq!(fresh, voted);

        let mut seen = HashSet::new();
        seen.insert(fresh);
        assert!(seen.contains(&voted));
    }

    #[test]
    fn test_post_type_paths() {
        assert_eq!(PostType::Top.as_path(), "news");
        assert_eq!(PostType::New.as_path(), "newest");
        assert_eq!(PostType::Jobs.as_path(), "jobs");
    }

    #[test]
    fn test_post_type_from_str() {
        assert_eq!("top".parse::<PostType>(), Ok(PostType::Top));
        assert_eq!("ASK".parse::<PostType>(), Ok(PostType::Ask));
        assert!("frontpage".parse::<PostType>().is_err());
    }

    #[test]
    fn test_vote_links_value_equality() {
        let a = VoteLinks { upvote: Some("vote?id=1&how=up".to_string()), unvote: None };
        let b = VoteLinks { upvote: Some("vote?id=1&how=up".to_string()), unvote: None };
        assert_eq!(a, b);
    }

    #[test]
    fn test_rendered_text_is_cached() {
        let c = Comment::new(
            1,
            "alice".to_string(),
            "2 hours ago".to_string(),
            0,
            "Hello <i>world</i>".to_string(),
            false,
            VoteLinks::default(),
        );
        let first = c.rendered_text() as *const StyledText;
        let second = c.rendered_text() as *const StyledText;
        assert_eq!(first, second);
        assert_eq!(c.rendered_text().plain_text(), "Hello world");
    }
}
