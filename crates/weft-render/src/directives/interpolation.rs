//! `{{ expr }}` interpolation, the final pass of every render.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use weft_expr::{Context, Evaluator};

static INTERPOLATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{\{\s*(.*?)\s*\}\}").unwrap());

/// Replaces each `{{ expr }}` span with its value; `null` becomes empty.
pub(crate) fn apply(eval: Evaluator<'_>, text: &str, ctx: &Context<'_>) -> String {
    INTERPOLATION
        .replace_all(text, |caps: &Captures| eval.evaluate(&caps[1], ctx).to_string())
        .into_owned()
}
