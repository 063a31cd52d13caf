//! Story extraction from listing and item pages.
//!
//! Listing pages render each story as a pair of table rows: a title row
//! (`tr.athing`, carrying the item id) and the metadata row immediately
//! after it (score, author, age, comment count). The pairing is purely
//! positional. Item pages render the same pair inside the `fatitem`
//! table, followed for text posts by the inline body.

use std::sync::OnceLock;

use regex::Regex;

use crate::item::{PostType, Story, VoteLinks};
use crate::parse::{Document, Element};
use crate::{PalaverError, Result};

/// Marker class the server puts on the visibility-hidden upvote arrow of
/// an already-voted row. Some themes signal vote state this way instead
/// of swapping in an `un_` anchor.
const HIDDEN_ARROW_CLASS: &str = "nosee";

/// Parses every story on a listing page.
///
/// A title row with no paired metadata row is dropped. A title row with a
/// missing id or title anchor is a hard error: the whole listing fails
/// rather than returning a partial story.
pub fn parse_listing(html: &str, post_type: PostType) -> Result<Vec<Story>> {
    let doc = Document::parse(html);
    let mut stories = Vec::new();

    for row in doc.select("tr.athing")? {
        if row.has_class("comtr") {
            continue;
        }
        let Some(meta) = metadata_row(&row)? else {
            continue;
        };
        stories.push(story_from_rows(&row, &meta, post_type)?);
    }

    Ok(stories)
}

/// Parses the single story of an item page, including the inline body
/// text of Ask-style posts.
pub fn parse_story(html: &str, post_type: PostType) -> Result<Story> {
    let doc = Document::parse(html);
    let fat = doc
        .select_first("table.fatitem")?
        .ok_or_else(|| PalaverError::StructuralParse("item page has no fatitem table".to_string()))?;

    let title_row = fat
        .select_first("tr.athing")?
        .ok_or_else(|| PalaverError::StructuralParse("fatitem has no story row".to_string()))?;
    let meta = metadata_row(&title_row)?
        .ok_or_else(|| PalaverError::StructuralParse("fatitem has no metadata row".to_string()))?;

    let mut story = story_from_rows(&title_row, &meta, post_type)?;
    story.body_text = body_text(&fat)?;
    Ok(story)
}

/// The metadata row paired with a title row, when present.
fn metadata_row<'a>(title_row: &Element<'a>) -> Result<Option<Element<'a>>> {
    let Some(row) = title_row.next_sibling_element() else {
        return Ok(None);
    };
    if row.select_first(".subtext")?.is_some() {
        Ok(Some(row))
    } else {
        Ok(None)
    }
}

fn story_from_rows(title_row: &Element, meta: &Element, post_type: PostType) -> Result<Story> {
    let id: u64 = title_row
        .attr("id")
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| PalaverError::StructuralParse("story row has no parsable id".to_string()))?;

    let title_anchor = match title_row.select_first(".titleline > a")? {
        Some(anchor) => anchor,
        // Pre-2021 markup puts the anchor directly in the title cell.
        None => title_row
            .select_first("td.title > a")?
            .ok_or_else(|| PalaverError::StructuralParse(format!("story {id} has no title anchor")))?,
    };
    let url = title_anchor
        .attr("href")
        .ok_or_else(|| PalaverError::StructuralParse(format!("story {id} title anchor has no href")))?
        .to_string();

    let score = meta
        .select_first(".score")?
        .and_then(|el| leading_u32(&el.text()))
        .unwrap_or(0);
    let author = meta
        .select_first(".hnuser")?
        .map(|el| el.text())
        .unwrap_or_default();
    let age_label = meta
        .select_first(".age")?
        .map(|el| el.text())
        .unwrap_or_default();
    let comment_count = comment_count(meta)?;
    let (upvoted, vote_links) = vote_state(title_row)?;

    Ok(Story {
        id,
        url,
        title: title_anchor.text(),
        author,
        age_label,
        score,
        comment_count,
        post_type,
        upvoted,
        vote_links,
        body_text: None,
        comments: None,
    })
}

/// Comment count from the metadata anchor whose text contains the word
/// "comment". Stories with no comments render "discuss" instead, and some
/// rows (jobs) have no such anchor at all; both count as zero.
fn comment_count(meta: &Element) -> Result<u32> {
    for anchor in meta.select("a")? {
        let text = anchor.text();
        if text.contains("comment") {
            return Ok(leading_u32(&text).unwrap_or(0));
        }
    }
    Ok(0)
}

/// Derives vote state from the anchors of a story or comment row.
///
/// An `un_`-prefixed anchor means the row is already upvoted and carries
/// the unvote URL. An `up_` anchor whose arrow is styled hidden signals
/// the same state without an `un_` anchor; both conditions are checked.
/// Otherwise the `up_` anchor's href is the upvote URL.
pub(crate) fn vote_state(row: &Element) -> Result<(bool, VoteLinks)> {
    let mut upvoted = false;
    let mut links = VoteLinks::default();

    for anchor in row.select("a[id]")? {
        let Some(id) = anchor.attr("id") else { continue };
        if id.starts_with("un_") {
            upvoted = true;
            links.unvote = anchor.attr("href").map(str::to_string);
        } else if id.starts_with("up_") {
            if anchor.has_class(HIDDEN_ARROW_CLASS) {
                upvoted = true;
            } else {
                links.upvote = anchor.attr("href").map(str::to_string);
            }
        }
    }

    // Vote state and link presence must stay mutually exclusive even if
    // the server renders both arrows.
    if upvoted {
        links.upvote = None;
    }
    Ok((upvoted, links))
}

/// Inline body of a text post, from the last content row of the fatitem
/// table. An authenticated session appends a reply-form row after the
/// body; detecting it means walking two rows further back (past the
/// spacer). Link posts have no body row, which is not an error.
fn body_text(fat: &Element) -> Result<Option<String>> {
    let rows = fat.select("tr")?;
    let Some(last) = rows.last() else {
        return Ok(None);
    };

    let candidate = if last.select_first("form")?.is_some() {
        match rows.len().checked_sub(3) {
            Some(back) => &rows[back],
            None => return Ok(None),
        }
    } else {
        last
    };

    if candidate.has_class("athing") || candidate.select_first(".subtext")?.is_some() {
        return Ok(None);
    }

    let body = match candidate.select_first(".toptext")? {
        Some(div) => div.inner_html(),
        None => match candidate.select("td")?.last() {
            Some(td) => td.inner_html(),
            None => return Ok(None),
        },
    };

    let trimmed = body.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Leading integer of a label such as "104 points" or "29&nbsp;comments".
pub(crate) fn leading_u32(text: &str) -> Option<u32> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = DIGITS.get_or_init(|| Regex::new(r"\d+").unwrap());
    re.find(text.trim_start())?.as_str().parse().ok()
}
