//! Allow-listed HTML rendering for assistant replies.
//!
//! Replies may carry a small markup subset (bold text and links to the
//! owner's profiles). Remote replies are untrusted, so every reply goes
//! through [`MarkupRenderer::render`]: text is escaped, allowed tags are
//! re-emitted in canonical form, and the output is always balanced.

use crate::error::{AssistantError, Result};
use regex::Regex;

const HREF: &str = r#"(?is)^<a\s[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenTag {
    Bold,
    Strong,
    Anchor,
}

impl OpenTag {
    fn close(self) -> &'static str {
        match self {
            Self::Bold => "</b>",
            Self::Strong => "</strong>",
            Self::Anchor => "</a>",
        }
    }
}

/// Renders reply text to safe HTML.
#[derive(Debug, Clone)]
pub struct MarkupRenderer {
    href: Regex,
    allowed_link_prefixes: Vec<String>,
}

impl MarkupRenderer {
    /// Create a renderer that keeps links starting with one of `prefixes`.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the anchor pattern fails to compile.
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let href = Regex::new(HREF)
            .map_err(|e| AssistantError::Config(format!("invalid anchor pattern: {e}")))?;
        Ok(Self {
            href,
            allowed_link_prefixes: prefixes.into_iter().map(Into::into).collect(),
        })
    }

    /// Render `text` to HTML.
    pub fn render(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 16);
        let mut open: Vec<OpenTag> = Vec::new();
        let mut rest = text;

        while let Some(lt) = rest.find('<') {
            escape_into(&mut out, &rest[..lt]);
            let tail = &rest[lt..];
            let gt = tail.find('>');
            let next_lt = tail[1..].find('<').map(|i| i + 1);

            match gt {
                Some(gt) if next_lt.is_none_or(|n| n > gt) => {
                    let raw = &tail[..=gt];
                    match self.accept_tag(raw, &mut open) {
                        Some(html) => out.push_str(html.as_str()),
                        None => escape_into(&mut out, raw),
                    }
                    rest = &tail[gt + 1..];
                }
                _ => {
                    out.push_str("&lt;");
                    rest = &tail[1..];
                }
            }
        }
        escape_into(&mut out, rest);

        for tag in open.into_iter().rev() {
            out.push_str(tag.close());
        }
        out
    }

    /// Canonical HTML for an allowed tag, an empty string for a stray
    /// closing tag, or `None` when the tag must be escaped.
    fn accept_tag(&self, raw: &str, open: &mut Vec<OpenTag>) -> Option<String> {
        let inner = raw[1..raw.len() - 1].trim().to_ascii_lowercase();
        let opening = |tag: OpenTag, html: &str, open: &mut Vec<OpenTag>| {
            open.push(tag);
            Some(html.to_owned())
        };

        match inner.as_str() {
            "b" => opening(OpenTag::Bold, "<b>", open),
            "strong" => opening(OpenTag::Strong, "<strong>", open),
            "br" | "br/" | "br /" => Some("<br>".to_owned()),
            "/b" | "/strong" | "/a" => {
                let tag = match inner.as_str() {
                    "/b" => OpenTag::Bold,
                    "/strong" => OpenTag::Strong,
                    _ => OpenTag::Anchor,
                };
                if open.last() == Some(&tag) {
                    open.pop();
                    Some(tag.close().to_owned())
                } else {
                    Some(String::new())
                }
            }
            s if s.strip_prefix('a').is_some_and(|r| r.starts_with(char::is_whitespace)) => {
                let href = self.allowed_href(raw)?;
                let mut html = String::from("<a href=\"");
                escape_into(&mut html, &href);
                html.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                open.push(OpenTag::Anchor);
                Some(html)
            }
            _ => None,
        }
    }

    fn allowed_href(&self, raw: &str) -> Option<String> {
        let caps = self.href.captures(raw)?;
        let href = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
        self.allowed_link_prefixes
            .iter()
            .any(|p| href.starts_with(p.as_str()))
            .then(|| href.to_owned())
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

/// Remove all tags, for replies that are spoken aloud.
///
/// A tag is `<` up to the next `>` with no `<` in between; a stray `<` is
/// kept as text.
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let tail = &rest[lt + 1..];
        match tail.find(['<', '>']) {
            Some(end) if tail.as_bytes()[end] == b'>' => rest = &tail[end + 1..],
            _ => {
                out.push('<');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn renderer() -> MarkupRenderer {
        MarkupRenderer::new(["https://www.linkedin.com/in/", "https://github.com/"]).unwrap()
    }

    #[test]
    fn keeps_bold_and_escapes_script() {
        let html = renderer().render("<b>Hi</b> <script>alert(1)</script>");
        assert_eq!(html, "<b>Hi</b> &lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[test]
    fn allowed_anchor_is_canonicalised() {
        let html = renderer().render(
            r#"See <a href="https://github.com/reseekesh821" target="_self" onclick="x()">GitHub</a>."#,
        );
        assert_eq!(
            html,
            r#"See <a href="https://github.com/reseekesh821" target="_blank" rel="noopener noreferrer">GitHub</a>."#
        );
    }

    #[test]
    fn disallowed_anchor_is_escaped_and_its_close_dropped() {
        let html = renderer().render(r#"<a href="javascript:alert(1)">x</a>"#);
        assert_eq!(html, "&lt;a href=&quot;javascript:alert(1)&quot;&gt;x");
    }

    #[test]
    fn unclosed_tags_are_closed_in_order() {
        assert_eq!(
            renderer().render("<strong>a <b>b"),
            "<strong>a <b>b</b></strong>"
        );
    }

    #[test]
    fn stray_angle_brackets_are_text() {
        assert_eq!(renderer().render("1 < 2 <b>ok</b>"), "1 &lt; 2 <b>ok</b>");
        assert_eq!(renderer().render("a > b"), "a &gt; b");
    }

    #[test]
    fn strip_tags_for_speech() {
        assert_eq!(
            strip_tags("Theme changed to <b>blue</b>."),
            "Theme changed to blue."
        );
        assert_eq!(
            strip_tags(r#"See <a href="https://github.com/x">GitHub</a>"#),
            "See GitHub"
        );
    }

    #[test]
    fn strip_tags_keeps_stray_brackets() {
        assert_eq!(strip_tags("1 < 2 and <b>3 > 2</b>"), "1 < 2 and 3 > 2");
        assert_eq!(strip_tags("trailing <"), "trailing <");
    }
}
