//! Directive processors.
//!
//! Each submodule implements one transformation the engine applies to a
//! template:
//!
//! | Processor | Directive | Effect |
//! |-----------|-----------|--------|
//! | [`loops`] | `for="item in items"` | one copy of the element per item |
//! | [`conditional`] | `if="expr"` | keep the element or drop it |
//! | [`binding`] | `bind:attr="expr"` | `attr="value"`, or nothing for `null` |
//! | [`interpolation`] | `{{ expr }}` | the stringified value |
//!
//! Directive attribute names carry the configured prefix (`p-if`, `p-for`,
//! `p-bind:href` with prefix `p-`) and match without regard to ASCII case.

pub(crate) mod binding;
pub(crate) mod conditional;
pub(crate) mod interpolation;
pub(crate) mod loops;

use weft_expr::{Context, Evaluator};

use crate::scanner::{Attr, AttrEdit, OpenTag};

/// Directive attribute names for one prefix, lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Directives {
    if_attr: String,
    for_attr: String,
    bind_prefix: String,
}

impl Directives {
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.to_ascii_lowercase();
        Self {
            if_attr: format!("{prefix}if"),
            for_attr: format!("{prefix}for"),
            bind_prefix: format!("{prefix}bind:"),
        }
    }

    pub fn is_if(&self, attr: &Attr) -> bool {
        attr.is(&self.if_attr)
    }

    /// The guard expression of the tag's first `if` attribute.
    pub fn guard<'a>(&self, tag: &OpenTag<'a>) -> Option<&'a str> {
        tag.attr(&self.if_attr).map(|attr| attr.value.unwrap_or(""))
    }

    pub fn for_attr(&self) -> &str {
        &self.for_attr
    }

    /// The bound attribute name of a `bind:NAME` attribute.
    pub fn bind_target<'a>(&self, attr: &Attr<'a>) -> Option<&'a str> {
        let prefix_len = self.bind_prefix.len();
        let head = attr.name.get(..prefix_len)?;
        let target = &attr.name[prefix_len..];
        (head.eq_ignore_ascii_case(&self.bind_prefix) && !target.is_empty()).then_some(target)
    }

    /// Rebuilds `tag` for output: attributes matching `strip` are removed and
    /// bindings are resolved against `ctx`.
    pub fn output_tag(
        &self,
        src: &str,
        tag: &OpenTag<'_>,
        eval: Evaluator<'_>,
        ctx: &Context<'_>,
        strip: impl Fn(&Attr) -> bool,
    ) -> String {
        tag.rebuild(src, |attr| {
            if strip(attr) {
                AttrEdit::Drop
            } else if let Some(target) = self.bind_target(attr) {
                binding::resolve(eval, target, attr.value.unwrap_or(""), ctx)
            } else {
                AttrEdit::Keep
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{Scanner, Token};

    fn first_tag(src: &str) -> OpenTag<'_> {
        match Scanner::new(src).next() {
            Some(Token::Open(tag)) => tag,
            other => panic!("expected an open tag, got {other:?}"),
        }
    }

    #[test]
    fn default_names() {
        let names = Directives::new("");
        let tag = first_tag(r#"<a IF="ok" bind:href="url" bind:="x" binding="y">"#);
        assert_eq!(names.guard(&tag), Some("ok"));
        let targets: Vec<_> = tag.attrs.iter().filter_map(|a| names.bind_target(a)).collect();
        assert_eq!(targets, vec!["href"]);
    }

    #[test]
    fn prefixed_names() {
        let names = Directives::new("P-");
        let tag = first_tag(r#"<a if="no" p-if="yes" P-Bind:title="t">"#);
        assert_eq!(names.guard(&tag), Some("yes"));
        assert_eq!(names.bind_target(&tag.attrs[2]), Some("title"));
        assert_eq!(names.for_attr(), "p-for");
    }

    #[test]
    fn bare_guard_is_empty_expression() {
        let names = Directives::new("");
        assert_eq!(names.guard(&first_tag("<p if>")), Some(""));
        assert_eq!(names.guard(&first_tag("<p>")), None);
    }
}
