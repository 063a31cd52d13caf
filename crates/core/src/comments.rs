//! Comment thread extraction.
//!
//! An item page renders its comments as `tr.comtr` rows in document
//! order, which is already the pre-order traversal of the thread tree;
//! nesting depth is conveyed by the width of an indentation spacer, not
//! by parent pointers. Long threads span multiple pages linked by a
//! "more comments" control, and an item id may address a comment rather
//! than a story, in which case the owning story is found by walking the
//! page's "parent" references.

use std::collections::HashSet;

use crate::fetch::Fetch;
use crate::item::{Comment, PostType, Story, VoteLinks};
use crate::listing::{self, parse_story};
use crate::parse::{Document, Element};
use crate::urls::{item_id_in_href, item_url};
use crate::{PalaverError, Result};

/// Pixel width of one level of comment indentation.
const INDENT_UNIT: u32 = 40;

/// Bound on the parent-chain walk during permalink resolution. The markup
/// gives no bound of its own; this one guarantees termination against a
/// cyclic or misconfigured parent reference.
pub const MAX_PARENT_HOPS: usize = 5;

/// Parses every comment row of an item page (or of several concatenated
/// pages) into the flat pre-order sequence.
///
/// A single malformed row (unparsable id or indentation) is dropped and
/// extraction continues; rows repeated across concatenated pages are kept
/// once.
pub fn parse_comments(html: &str) -> Result<Vec<Comment>> {
    let doc = Document::parse(html);
    let mut comments = Vec::new();
    let mut seen = HashSet::new();

    for row in doc.select("tr.comtr")? {
        let Some(comment) = comment_from_row(&row)? else {
            continue;
        };
        if seen.insert(comment.id) {
            comments.push(comment);
        }
    }

    Ok(comments)
}

fn comment_from_row(row: &Element) -> Result<Option<Comment>> {
    let Some(id) = row.attr("id").and_then(|raw| raw.parse::<i64>().ok()) else {
        return Ok(None);
    };
    let Some(level) = indent_level(row)? else {
        return Ok(None);
    };

    let author = row
        .select_first(".hnuser")?
        .map(|el| el.text())
        .unwrap_or_default();
    let age_label = row
        .select_first(".age")?
        .map(|el| el.text())
        .unwrap_or_default();

    // Deleted comments keep their row (descendants still hang off it) but
    // have no body element.
    let text = match row.select_first(".commtext")? {
        Some(el) => erase_reply_control(el.inner_html()),
        None => String::new(),
    };

    let (upvoted, vote_links) = listing::vote_state(row)?;

    Ok(Some(Comment::new(id, author, age_label, level, text, upvoted, vote_links)))
}

/// Nesting depth from the indentation spacer: image width divided by the
/// 40px unit. Newer markup also mirrors the level in an `indent`
/// attribute, honored as a fallback.
fn indent_level(row: &Element) -> Result<Option<u32>> {
    let Some(cell) = row.select_first("td.ind")? else {
        return Ok(None);
    };
    if let Some(width) = cell
        .select_first("img")?
        .and_then(|img| img.attr("width"))
        .and_then(|w| w.parse::<u32>().ok())
    {
        return Ok(Some(width / INDENT_UNIT));
    }
    Ok(cell.attr("indent").and_then(|i| i.parse().ok()))
}

/// Erases the embedded reply control from a comment body.
///
/// The reply link is nested inside the body element, so it is cut out of
/// the serialized HTML in place rather than removed as a node.
fn erase_reply_control(mut body: String) -> String {
    if let Some(idx) = body.find(r#"<div class="reply">"#) {
        body.truncate(idx);
    }
    body
}

/// Whether a page links a further comment page for the same item.
fn page_has_more_comments(html: &str) -> Result<bool> {
    let doc = Document::parse(html);
    Ok(doc
        .select(".morelink")?
        .iter()
        .any(|a| a.attr("href").is_some_and(|href| href.contains("item?id="))))
}

/// The parent reference exposed by a comment-permalink page, if any.
///
/// Only the item header (`fatitem`) is consulted; comment rows further
/// down the page carry their own navigation links that must not be
/// mistaken for the header's.
fn parent_reference(html: &str) -> Result<Option<u64>> {
    let doc = Document::parse(html);
    let Some(fat) = doc.select_first("table.fatitem")? else {
        return Ok(None);
    };
    for anchor in fat.select("a")? {
        if anchor.text() == "parent"
            && let Some(href) = anchor.attr("href")
            && let Some(id) = item_id_in_href(href)
        {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

/// Listing kind of a story as far as its own page reveals it.
fn inferred_post_type(title: &str, has_body: bool) -> PostType {
    if title.starts_with("Ask HN") || title.starts_with("Tell HN") {
        PostType::Ask
    } else if title.starts_with("Show HN") {
        PostType::Show
    } else if has_body {
        PostType::Ask
    } else {
        PostType::Top
    }
}

/// Loads a story and its full comment thread.
///
/// `id` may address the story itself or any comment within it (a comment
/// permalink); permalinks are resolved to the owning story first. With
/// `include_all`, every comment page is fetched and concatenated before
/// parsing; a permalink-resolved thread is always loaded in full so the
/// requested comment is guaranteed to be in range.
pub async fn load_thread<F: Fetch>(
    fetcher: &F,
    base: &str,
    id: u64,
    include_all: bool,
) -> Result<Story> {
    let mut current_id = id;
    let mut page = fetcher.fetch(&item_url(base, current_id, 1)).await?;

    let mut hops = 0;
    while let Some(parent_id) = parent_reference(&page)? {
        hops += 1;
        if hops > MAX_PARENT_HOPS {
            return Err(PalaverError::PermalinkResolution(format!(
                "parent chain for item {id} exceeded {MAX_PARENT_HOPS} hops"
            )));
        }
        current_id = parent_id;
        page = fetcher.fetch(&item_url(base, current_id, 1)).await?;
    }

    let resolved = current_id != id;
    let include_all = include_all || resolved;

    let mut accumulated = String::new();
    let mut last_page = page;
    let mut page_no = 1;
    loop {
        let fetch_next = include_all && page_has_more_comments(&last_page)?;
        accumulated.push_str(&last_page);
        if !fetch_next {
            break;
        }
        page_no += 1;
        last_page = fetcher.fetch(&item_url(base, current_id, page_no)).await?;
    }

    let mut story = parse_story(&accumulated, PostType::Top)?;
    story.post_type = inferred_post_type(&story.title, story.body_text.is_some());

    let mut comments = parse_comments(&accumulated)?;
    if let Some(body) = &story.body_text {
        comments.insert(0, synthetic_top_comment(&story, body));
    }

    if resolved && !comments.iter().any(|c| c.id == id as i64) {
        return Err(PalaverError::PermalinkResolution(format!(
            "comment {id} not present in resolved story {current_id}"
        )));
    }

    story.comments = Some(comments);
    Ok(story)
}

/// Pseudo comment presenting a text post's body at the top of its own
/// thread. The negated story id cannot collide with real comment ids,
/// which are always positive.
fn synthetic_top_comment(story: &Story, body: &str) -> Comment {
    Comment::new(
        -(story.id as i64),
        story.author.clone(),
        story.age_label.clone(),
        0,
        body.to_string(),
        false,
        VoteLinks::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct PageMap {
        pages: HashMap<String, String>,
        log: Mutex<Vec<String>>,
    }

    impl PageMap {
        fn new(pages: &[(&str, String)]) -> Self {
            Self {
                pages: pages.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                log: Mutex::new(Vec::new()),
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Fetch for PageMap {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.log.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| PalaverError::InvalidUrl(format!("no page for {url}")))
        }
    }

    fn comment_row(id: &str, width: u32, author: &str, body: &str) -> String {
        format!(
            r#"<tr class="athing comtr" id="{id}">
                <td><table><tr>
                    <td class="ind"><img src="s.gif" height="1" width="{width}"></td>
                    <td class="votelinks"><center>
                        <a id="up_{id}" href="vote?id={id}&amp;how=up&amp;goto=item"><div class="votearrow"></div></a>
                    </center></td>
                    <td class="default">
                        <span class="comhead">
                            <a href="user?id={author}" class="hnuser">{author}</a>
                            <span class="age"><a href="item?id={id}">1 hour ago</a></span>
                        </span>
                        <div class="comment">
                            <div class="commtext c00">{body}<div class="reply"><p><a href="reply?id={id}">reply</a></p></div></div>
                        </div>
                    </td>
                </tr></table></td>
            </tr>"#
        )
    }

    fn story_header(id: u64, title: &str, body: Option<&str>) -> String {
        let body_row = body
            .map(|b| format!(r#"<tr><td colspan="2"></td><td><div class="toptext">{b}</div></td></tr>"#))
            .unwrap_or_default();
        format!(
            r#"<table class="fatitem">
                <tr class="athing submission" id="{id}">
                    <td class="title"><span class="titleline"><a href="https://example.com/{id}">{title}</a></span></td>
                </tr>
                <tr><td class="subtext">
                    <span class="score">50 points</span>
                    <a href="user?id=norvig" class="hnuser">norvig</a>
                    <span class="age"><a href="item?id={id}">5 hours ago</a></span>
                    <a href="item?id={id}">3 comments</a>
                </td></tr>
                {body_row}
            </table>"#
        )
    }

    fn story_page(id: u64, title: &str, body: Option<&str>, rows: &str, more_page: Option<u32>) -> String {
        let more = more_page
            .map(|p| format!(r#"<a href="item?id={id}&amp;p={p}" class="morelink" rel="next">More</a>"#))
            .unwrap_or_default();
        format!(
            "<html><body>{}<table class=\"comment-tree\">{rows}</table>{more}</body></html>",
            story_header(id, title, body)
        )
    }

    fn permalink_page(id: u64, parent: u64, rows: &str) -> String {
        format!(
            r#"<html><body>
            <table class="fatitem">
                <tr class="athing comtr" id="{id}">
                    <td><table><tr>
                        <td class="ind"><img src="s.gif" height="1" width="0"></td>
                        <td class="default">
                            <span class="comhead">
                                <a href="user?id=bob" class="hnuser">bob</a>
                                <span class="age"><a href="item?id={id}">1 hour ago</a></span>
                                <span class="navs"> | <a href="item?id={parent}">parent</a> | <a href="item?id={parent}#{id}">context</a></span>
                            </span>
                            <div class="comment"><div class="commtext c00">the comment</div></div>
                        </td>
                    </tr></table></td>
                </tr>
            </table>
            <table class="comment-tree">{rows}</table>
            </body></html>"#
        )
    }

    #[test]
    fn test_parse_comments_flat_preorder() {
        let rows = [
            comment_row("601", 0, "alice", "root one"),
            comment_row("602", 40, "bob", "child"),
            comment_row("603", 80, "carol", "grandchild"),
            comment_row("604", 0, "dave", "root two"),
        ]
        .concat();
        let html = story_page(101, "A story", None, &rows, None);
        let comments = parse_comments(&html).unwrap();

        assert_eq!(comments.len(), 4);
        assert_eq!(
            comments.iter().map(|c| (c.id, c.level)).collect::<Vec<_>>(),
            vec![(601, 0), (602, 1), (603, 2), (604, 0)]
        );
        assert_eq!(comments[0].author, "alice");
        assert_eq!(comments[0].age_label, "1 hour ago");
        assert_eq!(comments[0].text, "root one");
        assert_eq!(comments[1].vote_links.upvote.as_deref(), Some("vote?id=602&how=up&goto=item"));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(40, 1)]
    #[case(80, 2)]
    #[case(120, 3)]
    fn test_indent_width_to_level(#[case] width: u32, #[case] level: u32) {
        let html = story_page(101, "A story", None, &comment_row("700", width, "eve", "hi"), None);
        let comments = parse_comments(&html).unwrap();
        assert_eq!(comments[0].level, level);
    }

    #[test]
    fn test_reply_control_is_erased_from_body() {
        let html = story_page(101, "A story", None, &comment_row("601", 0, "alice", "Visible <i>body</i>"), None);
        let comments = parse_comments(&html).unwrap();
        assert_eq!(comments[0].text, "Visible <i>body</i>");
        assert!(!comments[0].text.contains("reply"));
    }

    #[test]
    fn test_malformed_comment_row_is_dropped() {
        let bad = comment_row("not-an-id", 0, "mallory", "whatever");
        let rows = format!("{}{}", bad, comment_row("601", 0, "alice", "fine"));
        let html = story_page(101, "A story", None, &rows, None);
        let comments = parse_comments(&html).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, 601);
    }

    #[test]
    fn test_row_without_indent_cell_is_dropped() {
        let rows = format!(
            r#"<tr class="athing comtr" id="699"><td class="default">no spacer</td></tr>{}"#,
            comment_row("601", 0, "alice", "fine")
        );
        let html = story_page(101, "A story", None, &rows, None);
        let comments = parse_comments(&html).unwrap();
        assert_eq!(comments.len(), 1);
    }

    #[test]
    fn test_deleted_comment_keeps_position_with_empty_text() {
        let deleted = r#"<tr class="athing comtr" id="602">
            <td><table><tr>
                <td class="ind"><img src="s.gif" height="1" width="40"></td>
                <td class="default"><span class="comhead"></span></td>
            </tr></table></td>
        </tr>"#;
        let rows = format!(
            "{}{}{}",
            comment_row("601", 0, "alice", "root"),
            deleted,
            comment_row("603", 80, "carol", "reply to deleted")
        );
        let html = story_page(101, "A story", None, &rows, None);
        let comments = parse_comments(&html).unwrap();
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[1].text, "");
        assert_eq!(comments[1].level, 1);
    }

    #[test]
    fn test_voted_comment_state() {
        let row = r#"<tr class="athing comtr" id="605">
            <td><table><tr>
                <td class="ind"><img src="s.gif" height="1" width="0"></td>
                <td class="votelinks"><center>
                    <a id="up_605" class="nosee" href="vote?id=605&amp;how=up">up</a>
                    <a id="un_605" href="vote?id=605&amp;how=un">unvote</a>
                </center></td>
                <td class="default"><div class="comment"><div class="commtext c00">voted</div></div></td>
            </tr></table></td>
        </tr>"#;
        let html = story_page(101, "A story", None, row, None);
        let comments = parse_comments(&html).unwrap();
        assert!(comments[0].upvoted);
        assert!(comments[0].vote_links.upvote.is_none());
        assert_eq!(comments[0].vote_links.unvote.as_deref(), Some("vote?id=605&how=un"));
    }

    #[test]
    fn test_duplicate_rows_kept_once() {
        let rows = format!("{0}{0}", comment_row("601", 0, "alice", "once"));
        let html = story_page(101, "A story", None, &rows, None);
        assert_eq!(parse_comments(&html).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_thread_single_page() {
        let page = story_page(101, "A story", None, &comment_row("601", 0, "alice", "hello"), None);
        let fetcher = PageMap::new(&[("https://hn.test/item?id=101&p=1", page)]);

        let story = load_thread(&fetcher, "https://hn.test", 101, true).await.unwrap();
        assert_eq!(story.id, 101);
        assert_eq!(story.post_type, PostType::Top);
        let comments = story.comments.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(fetcher.fetched().len(), 1);
    }

    #[tokio::test]
    async fn test_load_thread_follows_pagination() {
        let p1 = story_page(101, "A story", None, &comment_row("601", 0, "alice", "first page"), Some(2));
        let p2 = story_page(101, "A story", None, &comment_row("602", 0, "bob", "second page"), None);
        let fetcher = PageMap::new(&[
            ("https://hn.test/item?id=101&p=1", p1),
            ("https://hn.test/item?id=101&p=2", p2),
        ]);

        let story = load_thread(&fetcher, "https://hn.test", 101, true).await.unwrap();
        let comments = story.comments.unwrap();
        assert_eq!(comments.iter().map(|c| c.id).collect::<Vec<_>>(), vec![601, 602]);
        assert_eq!(
            fetcher.fetched(),
            vec![
                "https://hn.test/item?id=101&p=1".to_string(),
                "https://hn.test/item?id=101&p=2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_load_thread_ignores_pagination_without_include_all() {
        let p1 = story_page(101, "A story", None, &comment_row("601", 0, "alice", "first page"), Some(2));
        let fetcher = PageMap::new(&[("https://hn.test/item?id=101&p=1", p1)]);

        let story = load_thread(&fetcher, "https://hn.test", 101, false).await.unwrap();
        assert_eq!(story.comments.unwrap().len(), 1);
        assert_eq!(fetcher.fetched().len(), 1);
    }

    #[tokio::test]
    async fn test_load_thread_resolves_comment_permalink() {
        let permalink = permalink_page(604, 101, &comment_row("605", 40, "erin", "nested reply"));
        let rows = format!(
            "{}{}",
            comment_row("603", 0, "carol", "top"),
            comment_row("604", 40, "bob", "the comment")
        );
        let story = story_page(101, "A story", None, &rows, None);
        let fetcher = PageMap::new(&[
            ("https://hn.test/item?id=604&p=1", permalink),
            ("https://hn.test/item?id=101&p=1", story),
        ]);

        let resolved = load_thread(&fetcher, "https://hn.test", 604, false).await.unwrap();
        assert_eq!(resolved.id, 101);
        assert!(resolved.comments.unwrap().iter().any(|c| c.id == 604));
        assert_eq!(
            fetcher.fetched(),
            vec![
                "https://hn.test/item?id=604&p=1".to_string(),
                "https://hn.test/item?id=101&p=1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_load_thread_rejects_cyclic_parent_chain() {
        let a = permalink_page(700, 701, "");
        let b = permalink_page(701, 700, "");
        let fetcher = PageMap::new(&[
            ("https://hn.test/item?id=700&p=1", a),
            ("https://hn.test/item?id=701&p=1", b),
        ]);

        let result = load_thread(&fetcher, "https://hn.test", 700, false).await;
        assert!(matches!(result, Err(PalaverError::PermalinkResolution(_))));
    }

    #[tokio::test]
    async fn test_load_thread_rejects_missing_original_comment() {
        let permalink = permalink_page(604, 101, "");
        let story = story_page(101, "A story", None, &comment_row("603", 0, "carol", "top"), None);
        let fetcher = PageMap::new(&[
            ("https://hn.test/item?id=604&p=1", permalink),
            ("https://hn.test/item?id=101&p=1", story),
        ]);

        let result = load_thread(&fetcher, "https://hn.test", 604, false).await;
        assert!(matches!(result, Err(PalaverError::PermalinkResolution(_))));
    }

    #[tokio::test]
    async fn test_load_thread_synthesizes_top_comment_for_text_post() {
        let page = story_page(
            121003,
            "Ask HN: The Arc Effect",
            Some("What really happens?"),
            &comment_row("121016", 0, "dood", "first answer"),
            None,
        );
        let fetcher = PageMap::new(&[("https://hn.test/item?id=121003&p=1", page)]);

        let story = load_thread(&fetcher, "https://hn.test", 121003, true).await.unwrap();
        assert_eq!(story.post_type, PostType::Ask);
        let comments = story.comments.unwrap();
        assert_eq!(comments[0].id, -121003);
        assert_eq!(comments[0].level, 0);
        assert_eq!(comments[0].author, "norvig");
        assert_eq!(comments[0].text, "What really happens?");
        assert_eq!(comments[1].id, 121016);
    }

    #[tokio::test]
    async fn test_load_thread_propagates_fetch_failure() {
        let fetcher = PageMap::new(&[]);
        let result = load_thread(&fetcher, "https://hn.test", 1, false).await;
        assert!(matches!(result, Err(PalaverError::InvalidUrl(_))));
    }
}
