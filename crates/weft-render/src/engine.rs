//! The render orchestrator.
//!
//! A render repeats three directive passes until the document stops
//! changing, then interpolates once:
//!
//! ```text
//! loop:
//!     loops -> conditionals -> bindings
//!     stop when the pass changed nothing
//! interpolation
//! ```
//!
//! Loop and conditional elements render their own content with a nested
//! call, so most documents settle after one changing pass. The nesting of
//! those calls is bounded by [`EngineConfig::max_depth`] and the number of
//! changing passes by [`EngineConfig::max_passes`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{trace, warn};
use weft_expr::{Context, Evaluator, HelperRegistry, Value};

use crate::config::EngineConfig;
use crate::directives::{binding, conditional, interpolation, loops, Directives};
use crate::error::{RenderError, Result};

/// Longest error message shown in a diagnostic comment, in characters.
const MAX_DIAGNOSTIC_LEN: usize = 200;

/// Renders templates against contexts.
///
/// An engine is immutable once built and cheap to share: renders take
/// `&self` and may run concurrently.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use weft_expr::{Context, HelperRegistry, Value};
/// use weft_render::{Engine, EngineConfig};
///
/// let helpers = HelperRegistry::builtin()
///     .register("stars", |args: &[Value]| {
///         let n = args.first().and_then(Value::as_number).and_then(|n| n.as_i64()).unwrap_or(0);
///         Ok(Value::from("*".repeat(n.clamp(0, 5) as usize)))
///     });
/// let engine = Engine::new(Arc::new(helpers))
///     .with_config(EngineConfig::new().directive_prefix("p-"));
///
/// let ctx = Context::new().with("rating", 3);
/// let html = engine.render(r#"<span p-if="rating > 0">{{ stars(rating) }}</span>"#, &ctx);
/// assert_eq!(html, "<span>***</span>");
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    helpers: Arc<HelperRegistry>,
    config: EngineConfig,
    directives: Directives,
}

impl Default for Engine {
    /// An engine with the built-in helpers and the default configuration.
    fn default() -> Self {
        Engine::new(HelperRegistry::builtin())
    }
}

impl Engine {
    /// Creates an engine with the default configuration.
    pub fn new(helpers: impl Into<Arc<HelperRegistry>>) -> Self {
        let config = EngineConfig::default();
        Self {
            helpers: helpers.into(),
            directives: Directives::new(&config.directive_prefix),
            config,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.directives = Directives::new(&config.directive_prefix);
        self.config = config;
        self
    }

    pub fn helpers(&self) -> &Arc<HelperRegistry> {
        &self.helpers
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Renders `template`, never failing.
    ///
    /// Failures that abort the render, including a panicking helper, replace
    /// the whole output with a `<!-- Template Error: ... -->` comment, or with
    /// nothing when diagnostics are disabled.
    pub fn render(&self, template: &str, ctx: &Context<'_>) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_render(template, ctx))) {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => self.diagnostic(&err),
            Err(payload) => self.diagnostic(&RenderError::Panic(panic_message(payload.as_ref()))),
        }
    }

    /// Renders `template` with any serializable data as the context.
    pub fn render_data<T: Serialize + ?Sized>(&self, template: &str, data: &T) -> String {
        match Context::from_serialize(data) {
            Ok(ctx) => self.render(template, &ctx),
            Err(err) => self.diagnostic(&RenderError::from(err)),
        }
    }

    /// Renders `template`, reporting failures instead of embedding them.
    pub fn try_render(&self, template: &str, ctx: &Context<'_>) -> Result<String> {
        self.render_nested(template, ctx, 0)
    }

    /// Evaluates a single expression with this engine's helpers.
    ///
    /// Unlike expressions inside templates, failures are reported rather than
    /// resolved as a plain path.
    pub fn evaluate(&self, expr: &str, ctx: &Context<'_>) -> Result<Value> {
        Ok(self.evaluator().try_evaluate(expr, ctx)?)
    }

    pub(crate) fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.helpers)
    }

    pub(crate) fn directives(&self) -> &Directives {
        &self.directives
    }

    /// Runs the directive passes to a fixed point, then interpolates.
    ///
    /// `depth` counts the directive elements enclosing `template`.
    pub(crate) fn render_nested(&self, template: &str, ctx: &Context<'_>, depth: usize) -> Result<String> {
        if depth > self.config.max_depth {
            return Err(RenderError::DepthExceeded {
                max: self.config.max_depth,
            });
        }

        let max_passes = self.config.max_passes.max(1);
        let mut current = template.to_string();
        let mut passes = 0;
        loop {
            let next = loops::apply(self, &current, ctx, depth)?;
            let next = conditional::apply(self, &next, ctx, depth)?;
            let next = binding::apply(self, &next, ctx);
            if next == current {
                break;
            }
            passes += 1;
            trace!(depth, passes, "directive pass changed the document");
            if passes > max_passes {
                return Err(RenderError::NoFixedPoint { passes: max_passes });
            }
            current = next;
        }

        Ok(interpolation::apply(self.evaluator(), &current, ctx))
    }

    fn diagnostic(&self, err: &RenderError) -> String {
        warn!(error = %err, "template render failed");
        if !self.config.diagnostics {
            return String::new();
        }
        format!("<!-- Template Error: {} -->", comment_safe(&err.to_string()))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Truncates `message` and breaks up `--` so it cannot end the comment.
fn comment_safe(message: &str) -> String {
    let mut safe: String = message.chars().take(MAX_DIAGNOSTIC_LEN).collect();
    if message.chars().nth(MAX_DIAGNOSTIC_LEN).is_some() {
        safe.push_str("...");
    }
    while safe.contains("--") {
        safe = safe.replace("--", "- -");
    }
    safe
}
