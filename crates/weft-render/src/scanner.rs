//! Markup scanner.
//!
//! Finds opening and closing tags in markup text without building a
//! document tree. Everything between tags is left as raw text; comments are
//! skipped, so directives inside `<!-- -->` are never seen.
//!
//! Element boundaries come from depth matching: the close tag of an element
//! is the first same-named close tag at which the count of same-named
//! open/close tags returns to zero, so nested `<div>`s inside a `<div>` pair
//! correctly.
//!
//! All positions are byte offsets into the scanned text.

use std::ops::Range;

use tracing::warn;

use crate::error::Result;

/// HTML elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// One attribute of an opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Attr<'a> {
    pub name: &'a str,
    /// Unquoted value; `None` for bare attributes like `disabled`.
    pub value: Option<&'a str>,
    /// Source range, including the whitespace before the name.
    pub span: Range<usize>,
}

impl Attr<'_> {
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// An opening tag: `<name attr="value" ...>` or `<name ... />`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenTag<'a> {
    pub name: &'a str,
    pub attrs: Vec<Attr<'a>>,
    pub self_closing: bool,
    pub span: Range<usize>,
}

impl<'a> OpenTag<'a> {
    /// True for tags that open no content: `<br>`, `<img ...>`, `<x/>`.
    pub fn is_empty_element(&self) -> bool {
        self.self_closing
            || VOID_ELEMENTS
                .iter()
                .any(|void| self.name.eq_ignore_ascii_case(void))
    }

    pub fn attr(&self, name: &str) -> Option<&Attr<'a>> {
        self.attrs.iter().find(|attr| attr.is(name))
    }

    /// Rewrites this tag's attributes, keeping all other source text.
    pub fn rebuild(&self, src: &str, mut edit: impl FnMut(&Attr<'a>) -> AttrEdit) -> String {
        let mut out = String::with_capacity(self.span.len());
        let mut cursor = self.span.start;
        for attr in &self.attrs {
            out.push_str(&src[cursor..attr.span.start]);
            let text = &src[attr.span.clone()];
            match edit(attr) {
                AttrEdit::Keep => out.push_str(text),
                AttrEdit::Drop => {}
                AttrEdit::Replace(replacement) => {
                    let indent = &text[..text.len() - text.trim_start().len()];
                    out.push_str(indent);
                    out.push_str(&replacement);
                }
            }
            cursor = attr.span.end;
        }
        out.push_str(&src[cursor..self.span.end]);
        out
    }
}

/// What [`OpenTag::rebuild`] does with one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrEdit {
    Keep,
    Drop,
    /// Replace the attribute text, keeping its leading whitespace.
    Replace(String),
}

/// A complete element: opening tag, content and closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element<'a> {
    pub open: OpenTag<'a>,
    /// Content range; empty for void and self-closing elements.
    pub inner: Range<usize>,
    /// Closing tag range, absent for void and self-closing elements.
    pub close: Option<Range<usize>>,
}

impl Element<'_> {
    pub fn inner<'s>(&self, src: &'s str) -> &'s str {
        &src[self.inner.clone()]
    }

    pub fn close_tag<'s>(&self, src: &'s str) -> &'s str {
        self.close.clone().map_or("", |span| &src[span])
    }
}

/// Token types produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Open(OpenTag<'a>),
    Close { name: &'a str, span: Range<usize> },
}

/// Iterator over the tags of a markup string.
pub(crate) struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn is_name_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
    }

    fn is_attr_name_byte(b: u8) -> bool {
        !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\'' | b'<')
    }

    fn name_end(&self, from: usize) -> usize {
        let bytes = self.src.as_bytes();
        let mut i = from;
        while i < bytes.len() && Self::is_name_byte(bytes[i]) {
            i += 1;
        }
        i
    }

    fn skip_whitespace(&self, from: usize) -> usize {
        let bytes = self.src.as_bytes();
        let mut i = from;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    }

    /// Parses `<name ...>` starting at the `<`; `None` if it is unterminated.
    fn open_tag(&self, start: usize) -> Option<OpenTag<'a>> {
        let src = self.src;
        let bytes = src.as_bytes();
        let name_end = self.name_end(start + 1);
        let mut tag = OpenTag {
            name: &src[start + 1..name_end],
            attrs: Vec::new(),
            self_closing: false,
            span: start..start,
        };

        let mut i = name_end;
        loop {
            let attr_start = i;
            i = self.skip_whitespace(i);
            match *bytes.get(i)? {
                b'>' => {
                    tag.span.end = i + 1;
                    return Some(tag);
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    tag.self_closing = true;
                    tag.span.end = i + 2;
                    return Some(tag);
                }
                b'/' => {
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let name_start = i;
            while i < bytes.len() && Self::is_attr_name_byte(bytes[i]) {
                i += 1;
            }
            if i == name_start {
                // A stray quote or '<' where a name belongs
                i += 1;
                continue;
            }
            let name = &src[name_start..i];

            let mut value = None;
            let after_name = self.skip_whitespace(i);
            if bytes.get(after_name) == Some(&b'=') {
                let value_start = self.skip_whitespace(after_name + 1);
                match *bytes.get(value_start)? {
                    quote @ (b'"' | b'\'') => {
                        let len = src[value_start + 1..].find(quote as char)?;
                        value = Some(&src[value_start + 1..value_start + 1 + len]);
                        i = value_start + len + 2;
                    }
                    _ => {
                        let mut end = value_start;
                        while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                            end += 1;
                        }
                        value = Some(&src[value_start..end]);
                        i = end;
                    }
                }
            }

            tag.attrs.push(Attr {
                name,
                value,
                span: attr_start..i,
            });
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.pos + self.src.get(self.pos..)?.find('<')?;
            let rest = &self.src[start + 1..];

            if rest.starts_with("!--") {
                self.pos = match rest[3..].find("-->") {
                    Some(end) => start + 4 + end + 3,
                    None => self.src.len(),
                };
                continue;
            }

            if let Some(close) = rest.strip_prefix('/') {
                let name_end = self.name_end(start + 2);
                if name_end > start + 2 {
                    if let Some(gt) = close.find('>') {
                        self.pos = start + 2 + gt + 1;
                        return Some(Token::Close {
                            name: &self.src[start + 2..name_end],
                            span: start..self.pos,
                        });
                    }
                }
                self.pos = start + 1;
                continue;
            }

            if rest.as_bytes().first().is_some_and(u8::is_ascii_alphabetic) {
                if let Some(tag) = self.open_tag(start) {
                    self.pos = tag.span.end;
                    return Some(Token::Open(tag));
                }
            }

            // Not a tag: "a < b", "<!DOCTYPE html>", an unterminated tag
            self.pos = start + 1;
        }
    }
}

/// Finds the close token matching an element named `name`, returning its
/// index and span.
///
/// `tokens` starts right after the element's opening tag.
fn matching_close(tokens: &[Token], name: &str) -> Option<(usize, Range<usize>)> {
    let mut depth = 1;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open(tag) if tag.name.eq_ignore_ascii_case(name) && !tag.is_empty_element() => {
                depth += 1
            }
            Token::Close { name: closing, span } if closing.eq_ignore_ascii_case(name) => {
                depth -= 1;
                if depth == 0 {
                    return Some((i, span.clone()));
                }
            }
            _ => {}
        }
    }
    None
}

/// What happens to a target element whose closing tag is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unclosed {
    /// Drop the opening tag and keep scanning its would-be content.
    DropTag,
    /// Drop the opening tag and everything after it.
    DropRest,
}

/// Replaces every outermost element whose opening tag satisfies `is_target`.
///
/// Elements nested inside a replaced element are not visited; `replace`
/// receives the whole element and decides what happens to its content. A
/// target whose closing tag is missing is handed to `unclosed` instead.
pub(crate) fn rewrite_elements<'a>(
    src: &'a str,
    mut is_target: impl FnMut(&OpenTag<'a>) -> bool,
    mut replace: impl FnMut(&Element<'a>) -> Result<String>,
    mut unclosed: impl FnMut(&OpenTag<'a>) -> Unclosed,
) -> Result<String> {
    let tokens: Vec<Token<'a>> = Scanner::new(src).collect();
    let mut out = String::with_capacity(src.len());
    let mut copied = 0;

    let mut i = 0;
    while i < tokens.len() {
        let Token::Open(open) = &tokens[i] else {
            i += 1;
            continue;
        };
        if !is_target(open) {
            i += 1;
            continue;
        }

        out.push_str(&src[copied..open.span.start]);
        if open.is_empty_element() {
            let element = Element {
                open: open.clone(),
                inner: open.span.end..open.span.end,
                close: None,
            };
            out.push_str(&replace(&element)?);
            copied = open.span.end;
            i += 1;
            continue;
        }

        match matching_close(&tokens[i + 1..], open.name) {
            Some((offset, span)) => {
                let close_at = i + 1 + offset;
                let element = Element {
                    open: open.clone(),
                    inner: open.span.end..span.start,
                    close: Some(span.clone()),
                };
                out.push_str(&replace(&element)?);
                copied = span.end;
                i = close_at + 1;
            }
            None => {
                let policy = unclosed(open);
                warn!(
                    tag = open.name,
                    offset = open.span.start,
                    ?policy,
                    "directive element has no closing tag, dropping it"
                );
                if policy == Unclosed::DropRest {
                    return Ok(out);
                }
                copied = open.span.end;
                i += 1;
            }
        }
    }

    out.push_str(&src[copied..]);
    Ok(out)
}

/// Rewrites individual opening tags; `edit` returns the replacement text.
pub(crate) fn rewrite_tags<'a>(
    src: &'a str,
    mut edit: impl FnMut(&OpenTag<'a>) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(src.len());
    let mut copied = 0;
    for token in Scanner::new(src) {
        if let Token::Open(tag) = token {
            if let Some(replacement) = edit(&tag) {
                out.push_str(&src[copied..tag.span.start]);
                out.push_str(&replacement);
                copied = tag.span.end;
            }
        }
    }
    out.push_str(&src[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token<'_>> {
        Scanner::new(src).collect()
    }

    fn open(src: &str) -> OpenTag<'_> {
        match tokens(src).into_iter().next() {
            Some(Token::Open(tag)) => tag,
            other => panic!("expected an open tag, got {other:?}"),
        }
    }

    mod tokenizer {
        use super::*;

        #[test]
        fn plain_text_has_no_tokens() {
            assert!(tokens("no tags here, 1 < 2").is_empty());
        }

        #[test]
        fn open_and_close() {
            let found = tokens("<p>hi</p>");
            assert_eq!(found.len(), 2);
            assert!(matches!(&found[0], Token::Open(tag) if tag.name == "p" && tag.span == (0..3)));
            assert!(matches!(&found[1], Token::Close { name: "p", span } if *span == (5..9)));
        }

        #[test]
        fn comments_are_skipped() {
            let found = tokens("<!-- <a if=\"x\"> --><b></b><!-- unterminated <c>");
            assert_eq!(found.len(), 2);
            assert!(matches!(&found[0], Token::Open(tag) if tag.name == "b"));
        }

        #[test]
        fn non_tags_are_skipped() {
            assert!(tokens("<!DOCTYPE html>").is_empty());
            assert!(tokens("< p>").is_empty());
            assert!(tokens("</>").is_empty());
            assert!(tokens("<p class=\"open").is_empty());
        }

        #[test]
        fn unicode_text_between_tags() {
            let found = tokens("<p>héllo ✓</p>");
            assert!(matches!(&found[1], Token::Close { name: "p", .. }));
        }
    }

    mod attributes {
        use super::*;

        #[test]
        fn quoting_styles() {
            let tag = open(r#"<input type="text" name='q' size=10 disabled>"#);
            let pairs: Vec<_> = tag.attrs.iter().map(|a| (a.name, a.value)).collect();
            assert_eq!(
                pairs,
                vec![
                    ("type", Some("text")),
                    ("name", Some("q")),
                    ("size", Some("10")),
                    ("disabled", None)
                ]
            );
            assert!(!tag.self_closing);
        }

        #[test]
        fn quoted_values_may_hold_angle_brackets() {
            let tag = open(r#"<li if="count > 2" class='a'>"#);
            assert_eq!(tag.attr("if").and_then(|a| a.value), Some("count > 2"));
            assert_eq!(tag.attr("class").and_then(|a| a.value), Some("a"));
        }

        #[test]
        fn spaces_around_equals() {
            let tag = open(r#"<a href = "/x" >"#);
            assert_eq!(tag.attr("href").and_then(|a| a.value), Some("/x"));
        }

        #[test]
        fn names_are_case_insensitive() {
            let tag = open(r#"<A HREF="/x">"#);
            assert!(tag.attr("href").is_some());
        }

        #[test]
        fn self_closing() {
            let tag = open(r#"<img src="a.png"/>"#);
            assert!(tag.self_closing);
            assert!(tag.is_empty_element());
            assert!(open("<br>").is_empty_element());
            assert!(!open("<div>").is_empty_element());
        }

        #[test]
        fn rebuild_preserves_untouched_text() {
            let src = r#"<a  class="x" bind:href="url"   id=y>"#;
            let tag = open(src);
            let rebuilt = tag.rebuild(src, |attr| match attr.name {
                "class" => AttrEdit::Drop,
                "bind:href" => AttrEdit::Replace("href=\"/\"".into()),
                _ => AttrEdit::Keep,
            });
            assert_eq!(rebuilt, r#"<a href="/"   id=y>"#);
        }
    }

    mod matching {
        use super::*;

        fn replace_with(src: &str, policy: Unclosed) -> String {
            rewrite_elements(
                src,
                |tag| tag.attr("x").is_some(),
                |el| Ok(format!("[{}]", el.inner(src))),
                |_| policy,
            )
            .unwrap()
        }

        fn replace_divs(src: &str) -> String {
            replace_with(src, Unclosed::DropTag)
        }

        #[test]
        fn nested_same_name_tags_pair_by_depth() {
            assert_eq!(
                replace_divs("<div x><div>a</div><div>b</div></div>!"),
                "[<div>a</div><div>b</div>]!"
            );
        }

        #[test]
        fn close_tags_match_case_insensitively() {
            assert_eq!(replace_divs("<DIV x>a</div>"), "[a]");
        }

        #[test]
        fn void_targets_have_no_content() {
            assert_eq!(replace_divs("<br x>after</br>"), "[]after</br>");
        }

        #[test]
        fn only_outermost_targets_are_replaced() {
            assert_eq!(replace_divs("<p x><p x>in</p></p><p x>2</p>"), "[<p x>in</p>][2]");
        }

        #[test]
        fn missing_close_drops_the_opening_tag() {
            assert_eq!(replace_divs("a<div x>b<p x>c</p>"), "ab[c]");
        }

        #[test]
        fn missing_close_can_drop_the_rest() {
            assert_eq!(replace_with("a<p x>b</p><div x>c<p x>d</p>", Unclosed::DropRest), "a[b]");
        }

        #[test]
        fn rewrite_tags_splices_replacements() {
            let src = "<a k>1</a><b>2</b>";
            let out = rewrite_tags(src, |tag| (tag.name == "a").then(|| "<i>".to_string()));
            assert_eq!(out, "<i>1</a><b>2</b>");
        }
    }
}
