//! Conditional elements: `<tag if="expr">...</tag>`.

use tracing::trace;
use weft_expr::Context;

use crate::engine::Engine;
use crate::error::Result;
use crate::scanner::{rewrite_elements, Unclosed};

/// Resolves every outermost `if` element in `text`.
///
/// A truthy guard keeps the element without its `if` attribute and renders
/// its content with the same context; anything else removes the element.
///
/// An element without a closing tag loses its opening tag. When its guard is
/// falsy the rest of `text` goes with it, so guarded content never leaks.
pub(crate) fn apply(engine: &Engine, text: &str, ctx: &Context<'_>, depth: usize) -> Result<String> {
    let names = engine.directives();
    let eval = engine.evaluator();
    rewrite_elements(
        text,
        |tag| names.guard(tag).is_some(),
        |element| {
            let guard = names.guard(&element.open).unwrap_or("");
            if !eval.evaluate(guard, ctx).is_truthy() {
                trace!(guard, "condition false, dropping element");
                return Ok(String::new());
            }
            let mut out = names.output_tag(text, &element.open, eval, ctx, |attr| names.is_if(attr));
            out.push_str(&engine.render_nested(element.inner(text), ctx, depth + 1)?);
            out.push_str(element.close_tag(text));
            Ok(out)
        },
        |open| {
            let guard = names.guard(open).unwrap_or("");
            if eval.evaluate(guard, ctx).is_truthy() {
                Unclosed::DropTag
            } else {
                Unclosed::DropRest
            }
        },
    )
}
