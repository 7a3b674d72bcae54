//! # Weft Render - Attribute-Directive Markup Templates
//!
//! `weft-render` renders markup templates whose logic lives in attributes:
//! plain HTML with `for`, `if` and `bind:` directives and `{{ }}`
//! interpolation, evaluated with the expression language of [`weft_expr`].
//!
//! ## Quick Start
//!
//! ```rust
//! use weft_render::{render, Context};
//! use serde_json::json;
//!
//! let ctx = Context::from_serialize(&json!({
//!     "user": {"name": "Ada"},
//!     "items": [{"name": "tea", "price": 2}, {"name": "cake", "price": 4.5}],
//!     "cart_url": "/cart"
//! }))
//! .unwrap();
//!
//! let template = r#"<h1>Hello {{ user.name }}</h1>
//! <ul if="items.length">
//!   <li for="item in items">{{ item.name }}: {{ item.price.toFixed(2) }}</li>
//! </ul>
//! <a bind:href="cart_url">Cart</a>"#;
//!
//! let html = render(template, &ctx);
//! assert_eq!(
//!     html,
//!     r#"<h1>Hello Ada</h1>
//! <ul>
//!   <li>tea: 2.00</li><li>cake: 4.50</li>
//! </ul>
//! <a href="/cart">Cart</a>"#
//! );
//! ```
//!
//! ## Directives
//!
//! | Directive | Example | Output |
//! |-----------|---------|--------|
//! | Loop | `<li for="x in xs">` | one element per item; `(x, i) in xs` binds the index or map key too |
//! | Conditional | `<p if="user.admin">` | the element, or nothing |
//! | Binding | `<a bind:href="url">` | `href="..."`, or no attribute for `null` |
//! | Interpolation | `{{ price.toFixed(2) }}` | the value as text, `null` as empty |
//!
//! Directive elements nest freely; a tag's close is found by counting
//! same-named tags, so `<div if="a"><div>..</div></div>` pairs correctly.
//! With [`EngineConfig::directive_prefix`] set to `"p-"` the directives are
//! `p-for`, `p-if` and `p-bind:`.
//!
//! ## Failure Handling
//!
//! Rendering favours output over strictness:
//!
//! - Unknown names are `null` and interpolate as nothing
//! - Broken expressions fall back to a plain path lookup of their text
//! - A directive element without a closing tag loses its opening tag; an
//!   unclosed `if` whose guard is false also hides the rest of its enclosing
//!   element, so guarded content is never shown
//! - Anything that aborts the render (nesting beyond
//!   [`EngineConfig::max_depth`], a document that never settles, a panicking
//!   helper) replaces the output with `<!-- Template Error: ... -->`
//!
//! [`Engine::try_render`] reports those failures as [`RenderError`] instead.
//!
//! ## Engines
//!
//! [`render`] uses a shared default engine. Build an [`Engine`] to add
//! helpers or change the configuration; it holds the helper registry in an
//! `Arc` and renders through `&self`, so one engine serves every thread.

mod config;
mod directives;
mod engine;
mod error;
mod scanner;

use once_cell::sync::Lazy;

pub use config::{EngineConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PASSES};
pub use engine::Engine;
pub use error::{RenderError, Result};

pub use weft_expr::{Context, HelperRegistry, Value};

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(Engine::default);

/// Renders `template` with the built-in helpers and default configuration.
///
/// Never fails; see [`Engine::render`].
pub fn render(template: &str, ctx: &Context<'_>) -> String {
    DEFAULT_ENGINE.render(template, ctx)
}

/// Returns the engine behind [`render`].
pub fn default_engine() -> &'static Engine {
    &DEFAULT_ENGINE
}
