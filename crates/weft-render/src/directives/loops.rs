//! Loop elements: `<tag for="item in items">...</tag>`.
//!
//! The element is emitted once per item, its content rendered with a derived
//! context binding the item. The `(item, key) in items` form also binds the
//! key: the zero-based index for sequences, the key for maps.
//!
//! An `if` on the loop element is checked per item against the derived
//! context and filters the items; `bind:` and `{{ }}` in the element's own
//! tag are also resolved per item.
//!
//! A `for` attribute without the `in` form, like `<label for="email">`, is
//! an ordinary attribute and is left alone.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use weft_expr::{Context, Value};

use super::{interpolation, Directives};
use crate::engine::Engine;
use crate::error::Result;
use crate::scanner::{rewrite_elements, OpenTag, Unclosed};

static LOOP_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^\s*(?:\(\s*([A-Za-z_$][\w$]*)\s*,\s*([A-Za-z_$][\w$]*)\s*\)|([A-Za-z_$][\w$]*))\s+in\s+(.+?)\s*$",
    )
    .unwrap()
});

/// A parsed `for` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoopSpec<'a> {
    pub item: &'a str,
    pub key: Option<&'a str>,
    pub collection: &'a str,
}

impl<'a> LoopSpec<'a> {
    pub fn parse(text: &'a str) -> Option<Self> {
        let caps = LOOP_SPEC.captures(text)?;
        let collection = caps.get(4)?.as_str();
        match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(item), Some(key), _) => Some(LoopSpec {
                item: item.as_str(),
                key: Some(key.as_str()),
                collection,
            }),
            (_, _, Some(item)) => Some(LoopSpec {
                item: item.as_str(),
                key: None,
                collection,
            }),
            _ => None,
        }
    }
}

impl Directives {
    /// The loop of a tag's `for` attribute, if it has the `in` form.
    pub fn loop_spec<'a>(&self, tag: &OpenTag<'a>) -> Option<LoopSpec<'a>> {
        tag.attrs
            .iter()
            .filter(|attr| attr.is(self.for_attr()))
            .find_map(|attr| attr.value.and_then(LoopSpec::parse))
    }
}

/// Expands every outermost loop element in `text`.
pub(crate) fn apply(engine: &Engine, text: &str, ctx: &Context<'_>, depth: usize) -> Result<String> {
    let names = engine.directives();
    let eval = engine.evaluator();
    rewrite_elements(
        text,
        |tag| names.loop_spec(tag).is_some(),
        |element| {
            let Some(spec) = names.loop_spec(&element.open) else {
                return Ok(String::new());
            };
            let entries: Vec<(Value, Value)> = match eval.evaluate(spec.collection, ctx) {
                Value::Seq(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (item, Value::from(i)))
                    .collect(),
                Value::Map(map) => map
                    .into_iter()
                    .map(|(key, item)| (item, Value::String(key)))
                    .collect(),
                other => {
                    debug!(
                        collection = spec.collection,
                        kind = other.type_name(),
                        "loop collection is not iterable, dropping element"
                    );
                    return Ok(String::new());
                }
            };

            let guard = names.guard(&element.open);
            let inner = element.inner(text);
            let mut out = String::new();
            for (item, key) in entries {
                let mut scope = ctx.derive(spec.item, item);
                if let Some(key_name) = spec.key {
                    scope.insert(key_name, key);
                }
                if let Some(guard) = guard {
                    if !eval.evaluate(guard, &scope).is_truthy() {
                        continue;
                    }
                }

                let tag = names.output_tag(text, &element.open, eval, &scope, |attr| {
                    names.is_if(attr)
                        || (attr.is(names.for_attr()) && attr.value.and_then(LoopSpec::parse).is_some())
                });
                out.push_str(&interpolation::apply(eval, &tag, &scope));
                out.push_str(&engine.render_nested(inner, &scope, depth + 1)?);
                out.push_str(element.close_tag(text));
            }
            Ok(out)
        },
        |_| Unclosed::DropTag,
    )
}
