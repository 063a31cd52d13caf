//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types the
//! extractors use to walk Hacker News markup with CSS selectors. HN pages
//! are table soups: stories and comments live in `<tr>` rows whose meaning
//! depends on class markers and on *position* (a story's metadata row is
//! the sibling immediately after its title row), so the wrapper exposes a
//! sibling walk alongside the usual selector queries.
//!
//! # Example
//!
//! ```rust
//! use palaver_core::parse::Document;
//!
//! let doc = Document::parse(r#"<table><tr class="athing" id="8863"><td>row</td></tr></table>"#);
//! let rows = doc.select("tr.athing").unwrap();
//! assert_eq!(rows[0].attr("id"), Some("8863"));
//! ```

use scraper::{ElementRef, Html, Selector};

use crate::{PalaverError, Result};

/// A parsed HTML page.
///
/// Parsing itself never fails; html5ever recovers from arbitrary input.
/// Selector queries fail only on invalid selector syntax, which for the
/// fixed selectors used by this crate indicates a programming error.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML document.
    ///
    /// Concatenated page sources (the comment paginator appends raw page
    /// text) are merged by the parser into one document, with rows kept in
    /// document order.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Selects elements anywhere in the document.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// First match for a selector, if any.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).next().map(Element::new))
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PalaverError::HtmlParse(format!("Invalid selector: {}", e)))
}

/// A wrapper around scraper's `ElementRef`.
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Inner HTML of this element, excluding its own tags.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Concatenated text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Whether this element carries the given class.
    pub fn has_class(&self, name: &str) -> bool {
        self.element.value().classes().any(|c| c == name)
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = compile(selector)?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }

    /// First matching descendant, if any.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'a>>> {
        let sel = compile(selector)?;
        Ok(self.element.select(&sel).next().map(Element::new))
    }

    /// The next sibling that is an element, skipping text and comment
    /// nodes. Positional row pairing relies on this.
    pub fn next_sibling_element(&self) -> Option<Element<'a>> {
        let mut node = self.element.next_sibling();
        while let Some(n) = node {
            if let Some(el) = ElementRef::wrap(n) {
                return Some(Element::new(el));
            }
            node = n.next_sibling();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <table>
            <tr class="athing submission" id="8863"><td class="title">Row one</td></tr>
            <tr><td class="subtext"><span class="score">104 points</span></td></tr>
            <tr class="spacer"></tr>
            <tr class="athing" id="9000"><td class="title">Row two</td></tr>
        </table>
    "#;

    #[test]
    fn test_select_rows() {
        let doc = Document::parse(SAMPLE);
        let rows = doc.select("tr.athing").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].attr("id"), Some("8863"));
        assert_eq!(rows[1].attr("id"), Some("9000"));
    }

    #[test]
    fn test_next_sibling_element_skips_text_nodes() {
        let doc = Document::parse(SAMPLE);
        let first = doc.select_first("tr.athing").unwrap().unwrap();
        let meta = first.next_sibling_element().unwrap();
        assert!(meta.select_first(".subtext").unwrap().is_some());
        assert_eq!(meta.select_first(".score").unwrap().unwrap().text(), "104 points");
    }

    #[test]
    fn test_has_class() {
        let doc = Document::parse(SAMPLE);
        let first = doc.select_first("tr.athing").unwrap().unwrap();
        assert!(first.has_class("submission"));
        assert!(!first.has_class("comtr"));
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE);
        assert!(matches!(doc.select("[[invalid"), Err(PalaverError::HtmlParse(_))));
    }

    #[test]
    fn test_text_flattens_children() {
        let doc = Document::parse(r#"<span class="age"><a href="item?id=1">2 hours ago</a></span>"#);
        let age = doc.select_first(".age").unwrap().unwrap();
        assert_eq!(age.text(), "2 hours ago");
    }
}
