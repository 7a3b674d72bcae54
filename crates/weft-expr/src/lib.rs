//! Weft expressions - the value model, scoped contexts, expression language
//! and helper library behind the weft markup template engine.
//!
//! Templates embed small JavaScript-flavoured expressions in `{{ }}` spans and
//! directive attributes. This crate evaluates them:
//!
//! - [`Value`]: tagged union of null, booleans, numbers, strings, sequences,
//!   ordered maps and caller-supplied functions
//! - [`Context`]: variable bindings with cheap derived scopes for loops
//! - [`Evaluator`]: parses expression text into an [`Expr`] tree and
//!   interprets it, never failing
//! - [`HelperRegistry`]: named functions callable from expressions
//!
//! # Quick Start
//!
//! ```rust
//! use weft_expr::{Context, Evaluator, HelperRegistry, Value};
//! use serde_json::json;
//!
//! let helpers = HelperRegistry::builtin();
//! let eval = Evaluator::new(&helpers);
//!
//! let ctx = Context::from_serialize(&json!({
//!     "user": {"name": "Ada", "roles": ["admin", "dev"]},
//!     "cart": {"total": 41.5}
//! }))
//! .unwrap();
//!
//! assert_eq!(eval.evaluate("user.name", &ctx), Value::from("Ada"));
//! assert_eq!(eval.evaluate("user.roles.length", &ctx), Value::from(2));
//! assert_eq!(eval.evaluate("cart.total.toFixed(2)", &ctx), Value::from("41.50"));
//! assert_eq!(eval.evaluate("upper(user.name) + '!'", &ctx), Value::from("ADA!"));
//! assert_eq!(eval.evaluate("user.nickname ?? 'none'", &ctx), Value::from("none"));
//!
//! // Broken expressions degrade instead of failing.
//! assert_eq!(eval.evaluate("user.name +", &ctx), Value::Null);
//! ```
//!
//! # Expression Syntax
//!
//! | Form | Example |
//! |------|---------|
//! | Literals | `42`, `3.5`, `'text'`, `"text"`, `true`, `null`, `[1, 2]`, `{a: 1}` |
//! | Access | `user.name`, `user?.name`, `items[0]`, `items[-1]`, `map['key']` |
//! | Calls | `upper(name)`, `price.toFixed(2)`, `name.lower()` |
//! | Arithmetic | `+ - * / %` (`+` concatenates strings) |
//! | Comparison | `== != === !== < <= > >= in` `not in` |
//! | Logic | `&& \|\| !` and `and or not` |
//! | Conditional | `cond ? a : b`, `a ?? b` |
//!
//! # Failure Semantics
//!
//! Unknown names and missing members are `null`, not errors. Genuine errors
//! (syntax, type mismatches, division by zero, helper failures) are
//! [`ExprError`]s from [`Evaluator::try_evaluate`]; [`Evaluator::evaluate`]
//! turns them into a plain path lookup of the original text.

mod ast;
mod context;
mod error;
mod eval;
mod helpers;
mod lexer;
mod op;
mod parser;
mod value;

pub use ast::Expr;
pub use context::Context;
pub use error::{ExprError, HelperError, HelperResult, Result};
pub use eval::Evaluator;
pub use helpers::HelperRegistry;
pub use op::{BinaryOp, UnaryOp};
pub use parser::parse;
pub use value::{Function, Map, Number, Value};
