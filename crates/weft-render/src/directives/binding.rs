//! Attribute binding: `bind:ATTR="EXPR"` becomes `ATTR="value"`.
//!
//! A `null` result removes the attribute instead of leaving `ATTR=""`, so
//! `bind:disabled="locked ? true : null"` toggles a boolean attribute.

use weft_expr::{Context, Evaluator, Value};

use crate::engine::Engine;
use crate::scanner::{rewrite_tags, AttrEdit};

/// Resolves every binding in `text` against `ctx`.
pub(crate) fn apply(engine: &Engine, text: &str, ctx: &Context<'_>) -> String {
    let names = engine.directives();
    let eval = engine.evaluator();
    rewrite_tags(text, |tag| {
        if !tag.attrs.iter().any(|attr| names.bind_target(attr).is_some()) {
            return None;
        }
        Some(names.output_tag(text, tag, eval, ctx, |_| false))
    })
}

/// The edit for one binding.
pub(crate) fn resolve(eval: Evaluator<'_>, target: &str, expr: &str, ctx: &Context<'_>) -> AttrEdit {
    match eval.evaluate(expr, ctx) {
        Value::Null => AttrEdit::Drop,
        value => AttrEdit::Replace(format!("{}=\"{}\"", target, escape_quotes(&value.to_string()))),
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use serde_json::json;

    fn bind(text: &str, ctx: &Context<'_>) -> String {
        apply(&Engine::default(), text, ctx)
    }

    #[test]
    fn binds_values() {
        let ctx = Context::new().with("url", "/x").with("n", 3);
        assert_eq!(bind(r#"<a bind:href="url">link</a>"#, &ctx), r#"<a href="/x">link</a>"#);
        assert_eq!(
            bind(r#"<td bind:colspan='n + 1' class="c">"#, &ctx),
            r#"<td colspan="4" class="c">"#
        );
    }

    #[test]
    fn null_removes_the_attribute() {
        let ctx = Context::new();
        assert_eq!(bind(r#"<input bind:disabled="missing" type="text">"#, &ctx), r#"<input type="text">"#);
        assert_eq!(bind("<input bind:disabled>", &ctx), "<input>");
    }

    #[test]
    fn quotes_in_values_are_escaped() {
        let ctx = Context::new().with("title", r#"say "hi""#);
        assert_eq!(
            bind(r#"<p bind:title="title">"#, &ctx),
            r#"<p title="say &quot;hi&quot;">"#
        );
    }

    #[test]
    fn falsy_non_null_values_are_kept() {
        let ctx = Context::from_serialize(&json!({"zero": 0, "off": false, "tags": ["a", "b"]})).unwrap();
        assert_eq!(
            bind(r#"<x bind:a="zero" bind:b="off" bind:c="tags">"#, &ctx),
            r#"<x a="0" b="false" c="[&quot;a&quot;,&quot;b&quot;]">"#
        );
    }

    #[test]
    fn text_outside_tags_is_untouched() {
        let ctx = Context::new().with("url", "/x");
        assert_eq!(bind(r#"bind:href="url" <!-- <a bind:href="url"> -->"#, &ctx), r#"bind:href="url" <!-- <a bind:href="url"> -->"#);
    }

    #[test]
    fn prefixed_bindings() {
        let engine = Engine::default().with_config(EngineConfig::new().directive_prefix("p-"));
        let ctx = Context::new().with("url", "/x");
        assert_eq!(
            apply(&engine, r#"<a p-bind:href="url" bind:id="url">"#, &ctx),
            r#"<a href="/x" bind:id="url">"#
        );
    }
}
