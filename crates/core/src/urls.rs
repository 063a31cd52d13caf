//! Endpoint construction for the Hacker News web frontend.
//!
//! Every page the core requests has one of two shapes:
//! `{base}/{listing}?p={page}` for story listings and
//! `{base}/item?id={id}&p={page}` for item pages. Vote URLs are never
//! fetched here; the core only derives them from markup (and, for an
//! optimistic local vote, synthesizes the unvote URL from the upvote URL).

use std::sync::OnceLock;

use regex::Regex;

use crate::item::PostType;

/// Production frontend the default client talks to.
pub const BASE_URL: &str = "https://news.ycombinator.com";

/// Builds the URL of a listing page for the given post type.
///
/// Pages are 1-based, matching the frontend's `p` parameter.
pub fn listing_url(base: &str, kind: PostType, page: u32) -> String {
    format!("{}/{}?p={}", base.trim_end_matches('/'), kind.as_path(), page)
}

/// Builds the URL of an item page (story or comment permalink).
pub fn item_url(base: &str, id: u64, page: u32) -> String {
    format!("{}/item?id={}&p={}", base.trim_end_matches('/'), id, page)
}

/// Extracts the `id` query parameter from an item href.
///
/// Hrefs in HN markup are relative (`item?id=123`), so this works on the
/// raw attribute value rather than going through a URL parser.
pub fn item_id_in_href(href: &str) -> Option<u64> {
    static ID_RE: OnceLock<Regex> = OnceLock::new();
    let re = ID_RE.get_or_init(|| Regex::new(r"(?:\?|&|&amp;)id=(\d+)").unwrap());
    re.captures(href)?.get(1)?.as_str().parse().ok()
}

/// Derives the unvote URL from an upvote URL.
///
/// After an optimistic local vote the client may only know the upvote URL;
/// the server's unvote URL differs only in the vote-direction parameter.
/// Substitutes `how=up` with `how=un` in either its literal or
/// percent-encoded form. A URL carrying neither form is returned unchanged.
pub fn derive_unvote_url(upvote: &str) -> String {
    if upvote.contains("how=up") {
        upvote.replacen("how=up", "how=un", 1)
    } else if upvote.contains("how%3Dup") {
        upvote.replacen("how%3Dup", "how%3Dun", 1)
    } else {
        upvote.to_string()
    }
}
