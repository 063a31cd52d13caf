//! Rich-text rendering of comment and story bodies.
//!
//! HN bodies arrive as small HTML fragments using a limited tag set:
//! `<p>` separators, `<a href>` links, `<i>`/`<em>` and `<b>`/`<strong>`
//! emphasis, `<code>` inline code, and `<pre><code>` blocks. [`render`]
//! converts such a fragment into a [`StyledText`]: a sequence of runs,
//! each carrying plain text, an optional hyperlink target, emphasis
//! intents, and whether it follows a paragraph break.
//!
//! Tags outside the interpreted set are stripped; their text content and
//! all surrounding whitespace survive byte-for-byte. Malformed markup
//! degrades to plain text, it never fails: rendering is total.
//!
//! # Example
//!
//! ```rust
//! use palaver_core::richtext::render;
//!
//! let styled = render(r#"See <a href="https://example.com">the docs</a>."#);
//! assert_eq!(styled.plain_text(), "See the docs.");
//! assert_eq!(styled.runs[1].link.as_deref(), Some("https://example.com"));
//! ```

use serde::Serialize;
use url::Url;

/// Emphasis intents attached to a run. Nested tags compose: a `<b>` inside
/// a link inside an `<i>` yields a run with both flags and the link target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Emphasis {
    pub bold: bool,
    pub italic: bool,
    /// Monospaced text, from `<code>` or a `<pre>` block.
    pub code: bool,
}

/// A contiguous span of output text sharing one set of style intents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub text: String,
    /// Hyperlink target; `None` for plain or degraded (malformed) links.
    pub link: Option<String>,
    pub emphasis: Emphasis,
    /// Whether this run follows a paragraph break (a double line break).
    pub paragraph_break: bool,
}

/// Styled-text projection of an HTML fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyledText {
    pub runs: Vec<Run>,
}

impl StyledText {
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Flattens the runs to plain text.
    ///
    /// A run with `paragraph_break` is preceded by a double line break.
    /// The single line break that follows a code block is already part of
    /// the next run's text.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            if run.paragraph_break && !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&run.text);
        }
        out
    }
}

/// Decodes the fixed entity table via literal substring replacement.
///
/// `&amp;` is replaced last so that a literal `&amp;lt;` decodes to the
/// text `&lt;` rather than `<`.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Paragraph,
    Anchor,
    Bold,
    Italic,
    Code,
    Pre,
}

fn interpret(name: &str) -> Option<Tag> {
    match name.to_ascii_lowercase().as_str() {
        "p" => Some(Tag::Paragraph),
        "a" => Some(Tag::Anchor),
        "b" | "strong" => Some(Tag::Bold),
        "i" | "em" => Some(Tag::Italic),
        "code" => Some(Tag::Code),
        "pre" => Some(Tag::Pre),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Token<'a> {
    Text(&'a str),
    Open { name: &'a str, attrs: &'a str },
    Close { name: &'a str },
}

/// Splits a fragment into text and tag tokens.
///
/// A `<` only starts a tag token when followed by an optional `/` and an
/// ASCII-alphabetic name with a closing `>`; anything else stays literal
/// text.
fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = html.as_bytes();
    let mut pos = 0;
    let mut text_start = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }

        let rest = &html[pos + 1..];
        let (closing, body) = match rest.strip_prefix('/') {
            Some(after) => (true, after),
            None => (false, rest),
        };
        let name_len = body.bytes().take_while(u8::is_ascii_alphabetic).count();
        let gt = body.find('>');

        match (name_len, gt) {
            (n, Some(end)) if n > 0 => {
                if text_start < pos {
                    tokens.push(Token::Text(&html[text_start..pos]));
                }
                let name = &body[..n];
                if closing {
                    tokens.push(Token::Close { name });
                } else {
                    tokens.push(Token::Open { name, attrs: &body[n..end] });
                }
                pos += 1 + usize::from(closing) + end + 1;
                text_start = pos;
            }
            _ => {
                // Not a tag; the '<' is literal text.
                pos += 1;
            }
        }
    }

    if text_start < html.len() {
        tokens.push(Token::Text(&html[text_start..]));
    }

    tokens
}

/// Extracts and decodes the href attribute value from a raw attribute
/// string. Tolerates extra attributes and both quote styles; anything
/// else yields `None`.
fn href_in(attrs: &str) -> Option<String> {
    let idx = attrs.find("href=")?;
    let rest = &attrs[idx + 5..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value = &rest[1..];
    let end = value.find(quote)?;
    Some(decode_entities(&value[..end]))
}

struct Renderer {
    runs: Vec<Run>,
    bold: u32,
    italic: u32,
    code: u32,
    pre: u32,
    link: Option<String>,
    /// Set when the next visible text starts a new block.
    pending_break: bool,
    /// Set right after a `<pre>` block closes; the next run resumes after
    /// a single line break, not a blank line.
    after_block: bool,
    /// Whether the fragment contains a `<p>` tag anywhere. Without one,
    /// raw newlines carry no structure and collapse to spaces.
    has_paragraphs: bool,
}

impl Renderer {
    fn new(has_paragraphs: bool) -> Self {
        Self {
            runs: Vec::new(),
            bold: 0,
            italic: 0,
            code: 0,
            pre: 0,
            link: None,
            pending_break: false,
            after_block: false,
            has_paragraphs,
        }
    }

    fn block_boundary(&mut self) {
        if !self.runs.is_empty() {
            self.pending_break = true;
        }
    }

    fn emit_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        // Whitespace between block boundaries is formatting noise, not
        // content; the boundary itself supplies the separation.
        if self.pending_break && raw.trim().is_empty() {
            return;
        }

        let mut text = decode_entities(raw);
        if self.pre == 0 && !self.has_paragraphs {
            text = text.replace('\n', " ");
        }

        let paragraph_break = std::mem::take(&mut self.pending_break);
        if std::mem::take(&mut self.after_block) && !paragraph_break {
            text.insert(0, '\n');
        }

        let emphasis = Emphasis {
            bold: self.bold > 0,
            italic: self.italic > 0,
            code: self.code > 0 || self.pre > 0,
        };

        if !paragraph_break
            && let Some(last) = self.runs.last_mut()
            && last.link == self.link
            && last.emphasis == emphasis
        {
            last.text.push_str(&text);
            return;
        }

        self.runs.push(Run { text, link: self.link.clone(), emphasis, paragraph_break });
    }

    fn open_anchor(&mut self, attrs: &str) {
        let target = href_in(attrs).filter(|href| Url::parse(href).is_ok());
        if self.link.is_none() {
            self.link = target;
        }
    }

    fn finish(mut self) -> StyledText {
        while self.runs.first().is_some_and(|r| r.text.trim().is_empty()) {
            self.runs.remove(0);
        }
        while self.runs.last().is_some_and(|r| r.text.trim().is_empty()) {
            self.runs.pop();
        }
        if let Some(first) = self.runs.first_mut() {
            first.text = first.text.trim_start().to_string();
            first.paragraph_break = false;
        }
        if let Some(last) = self.runs.last_mut() {
            last.text = last.text.trim_end().to_string();
        }
        StyledText { runs: self.runs }
    }
}

/// Renders an HTML fragment into styled text.
///
/// Total over arbitrary input: malformed markup degrades to plain text,
/// and input with no visible characters yields an empty value.
pub fn render(html: &str) -> StyledText {
    let tokens = tokenize(html);
    let has_paragraphs = tokens
        .iter()
        .any(|t| matches!(t, Token::Open { name, .. } if interpret(name) == Some(Tag::Paragraph)));

    let mut r = Renderer::new(has_paragraphs);
    for (i, token) in tokens.iter().enumerate() {
        match *token {
            Token::Text(text) => r.emit_text(text),
            Token::Open { name, attrs } => match interpret(name) {
                Some(Tag::Paragraph) => r.block_boundary(),
                Some(Tag::Pre) => {
                    r.block_boundary();
                    r.pre += 1;
                }
                Some(Tag::Code) => r.code += 1,
                Some(Tag::Bold) => r.bold += 1,
                Some(Tag::Italic) => r.italic += 1,
                Some(Tag::Anchor) => {
                    // An anchor that never closes degrades to plain text.
                    let terminated = tokens[i + 1..].iter().any(|t| {
                        matches!(t, Token::Close { name } if interpret(name) == Some(Tag::Anchor))
                    });
                    if terminated {
                        r.open_anchor(attrs);
                    }
                }
                None => {}
            },
            Token::Close { name } => match interpret(name) {
                Some(Tag::Paragraph) => r.block_boundary(),
                Some(Tag::Pre) => {
                    r.pre = r.pre.saturating_sub(1);
                    if r.pre == 0 {
                        r.after_block = true;
                    }
                }
                Some(Tag::Code) => r.code = r.code.saturating_sub(1),
                Some(Tag::Bold) => r.bold = r.bold.saturating_sub(1),
                Some(Tag::Italic) => r.italic = r.italic.saturating_sub(1),
                Some(Tag::Anchor) => r.link = None,
                None => {}
            },
        }
    }
    r.finish()
}
