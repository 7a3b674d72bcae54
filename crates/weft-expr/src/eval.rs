//! Tree-walking interpreter over [`Expr`].
//!
//! The interpreter only reaches the values in the [`Context`] and the
//! functions in the [`HelperRegistry`]. There is no other scope.

use tracing::debug;

use crate::ast::Expr;
use crate::context::Context;
use crate::error::{ExprError, HelperResult, Result};
use crate::helpers::{self, HelperRegistry};
use crate::op::BinaryOp;
use crate::parser::parse;
use crate::value::{seq_index, Map, Value};

/// Evaluates expression text against a context.
///
/// # Example
///
/// ```
/// use weft_expr::{Context, Evaluator, HelperRegistry, Value};
///
/// let helpers = HelperRegistry::builtin();
/// let eval = Evaluator::new(&helpers);
/// let ctx = Context::new().with("price", 3.5).with("qty", 2);
///
/// assert_eq!(eval.evaluate("price.toFixed(2)", &ctx), Value::from("3.50"));
/// assert_eq!(eval.evaluate("qty > 1 ? 'many' : 'one'", &ctx), Value::from("many"));
/// assert_eq!(eval.evaluate("upper('ok')", &ctx), Value::from("OK"));
/// assert_eq!(eval.evaluate("missing ?? 'none'", &ctx), Value::from("none"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'h> {
    helpers: &'h HelperRegistry,
}

impl<'h> Evaluator<'h> {
    pub fn new(helpers: &'h HelperRegistry) -> Self {
        Evaluator { helpers }
    }

    /// The registry calls are resolved against.
    pub fn helpers(&self) -> &'h HelperRegistry {
        self.helpers
    }

    /// Evaluates `source`, never failing.
    ///
    /// Any parse or evaluation error falls back to [`Context::resolve`] on the
    /// original text, which yields `Value::Null` when that misses too.
    pub fn evaluate(&self, source: &str, ctx: &Context<'_>) -> Value {
        match self.try_evaluate(source, ctx) {
            Ok(value) => value,
            Err(err) => {
                debug!(expr = source, error = %err, "expression failed, resolving as path");
                ctx.resolve(source)
            }
        }
    }

    /// Evaluates `source`, reporting the first error.
    pub fn try_evaluate(&self, source: &str, ctx: &Context<'_>) -> Result<Value> {
        let source = source.trim();
        // Keys that are not valid identifiers ("odd.key", "data-id") resolve directly.
        if let Some(value) = ctx.get(source) {
            return Ok(value.clone());
        }
        let expr = parse(source)?;
        self.eval(&expr, ctx)
    }

    /// Evaluates an already parsed expression.
    pub fn eval(&self, expr: &Expr, ctx: &Context<'_>) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(name) => Ok(ctx.get(name).cloned().unwrap_or_default()),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item, ctx))
                .collect::<Result<Vec<_>>>()
                .map(Value::Seq),
            Expr::Object(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value, ctx)?);
                }
                Ok(Value::Map(map))
            }
            Expr::Member(target, name) => {
                let target = self.eval(target, ctx)?;
                Ok(member(&target, name))
            }
            Expr::Index(target, index) => {
                let target = self.eval(target, ctx)?;
                let index = self.eval(index, ctx)?;
                Ok(index_value(&target, &index))
            }
            Expr::Call(name, args) => {
                let args = self.eval_args(args, ctx)?;
                self.call(name, &args, ctx)
            }
            Expr::MethodCall(receiver, name, args) => {
                let receiver = self.eval(receiver, ctx)?;
                let args = self.eval_args(args, ctx)?;
                self.call_method(receiver, name, &args)
            }
            Expr::Unary(op, operand) => op.apply(&self.eval(operand, ctx)?),
            Expr::Binary(BinaryOp::And, left, right) => {
                let left = self.eval(left, ctx)?;
                if left.is_truthy() {
                    self.eval(right, ctx)
                } else {
                    Ok(left)
                }
            }
            Expr::Binary(BinaryOp::Or, left, right) => {
                let left = self.eval(left, ctx)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right, ctx)
                }
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left, ctx)?;
                let right = self.eval(right, ctx)?;
                op.apply(&left, &right)
            }
            Expr::Ternary(cond, then, otherwise) => {
                if self.eval(cond, ctx)?.is_truthy() {
                    self.eval(then, ctx)
                } else {
                    self.eval(otherwise, ctx)
                }
            }
            Expr::Coalesce(left, right) => match self.eval(left, ctx)? {
                Value::Null => self.eval(right, ctx),
                value => Ok(value),
            },
        }
    }

    fn eval_args(&self, args: &[Expr], ctx: &Context<'_>) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, ctx)).collect()
    }

    /// `name(args)`: registered helper, then a callable bound in the context.
    fn call(&self, name: &str, args: &[Value], ctx: &Context<'_>) -> Result<Value> {
        if let Some(helper) = self.helpers.get(name) {
            return invoke(name, helper.call(args));
        }
        match ctx.get(name) {
            Some(Value::Function(f)) => invoke(name, f.call(args)),
            _ => {
                debug!(function = name, "no helper or callable with this name");
                Ok(Value::Null)
            }
        }
    }

    fn call_method(&self, receiver: Value, name: &str, args: &[Value]) -> Result<Value> {
        if let Some(value) = builtin_method(&receiver, name, args) {
            return invoke(name, value);
        }
        if let Some(Value::Function(f)) = receiver.get(name) {
            return invoke(name, f.call(args));
        }
        if let Some(helper) = self.helpers.get(name) {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(receiver);
            full.extend_from_slice(args);
            return invoke(name, helper.call(&full));
        }
        Err(ExprError::UnknownMethod {
            method: name.to_string(),
            receiver: receiver.type_name(),
        })
    }
}

fn invoke(name: &str, result: HelperResult) -> Result<Value> {
    result.map_err(|source| ExprError::Helper {
        name: name.to_string(),
        source,
    })
}

fn member(target: &Value, name: &str) -> Value {
    match target.get(name) {
        Some(value) => value.clone(),
        None if name == "length" => target.length().map_or(Value::Null, Value::from),
        None => Value::Null,
    }
}

fn index_value(target: &Value, index: &Value) -> Value {
    match (target, index) {
        (Value::Seq(items), Value::Number(n)) => n
            .as_i64()
            .and_then(|i| seq_index(items, i))
            .cloned()
            .unwrap_or_default(),
        (Value::String(s), Value::Number(n)) => {
            let chars: Vec<Value> = s.chars().map(|c| Value::String(c.to_string())).collect();
            n.as_i64()
                .and_then(|i| seq_index(&chars, i))
                .cloned()
                .unwrap_or_default()
        }
        (Value::Map(_), key) | (Value::Seq(_), key @ Value::String(_)) => {
            member(target, &key.to_string())
        }
        _ => Value::Null,
    }
}

/// Methods with JavaScript names the template syntax carries over.
fn builtin_method(receiver: &Value, name: &str, args: &[Value]) -> Option<HelperResult> {
    let arg = |i: usize| helpers::arg(args, i);
    let result = match (name, receiver) {
        ("toFixed", _) => helpers::number::to_fixed(receiver, arg(0)),
        ("toString", _) => Ok(Value::String(receiver.to_string())),
        ("toUpperCase", Value::String(s)) => Ok(Value::String(s.to_uppercase())),
        ("toLowerCase", Value::String(s)) => Ok(Value::String(s.to_lowercase())),
        ("trim", Value::String(s)) => Ok(Value::String(s.trim().to_string())),
        ("startsWith", Value::String(s)) => Ok(Value::Bool(s.starts_with(&arg(0).to_string()))),
        ("endsWith", Value::String(s)) => Ok(Value::Bool(s.ends_with(&arg(0).to_string()))),
        ("includes", Value::String(s)) => Ok(Value::Bool(s.contains(&arg(0).to_string()))),
        ("includes", Value::Seq(items)) => Ok(Value::Bool(items.contains(arg(0)))),
        ("join", Value::Seq(items)) => {
            let sep = match arg(0) {
                Value::Null => ",".to_string(),
                other => other.to_string(),
            };
            Ok(Value::String(
                items
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(&sep),
            ))
        }
        _ => return None,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Context<'static> {
        Context::from_value(Value::from(json!({
            "name": "Ada",
            "price": 3.5,
            "qty": 2,
            "zero": 0,
            "user": {"name": "Grace", "roles": ["admin", "dev"]},
            "items": [1, 2, 3],
            "odd.key": "direct",
            "empty": []
        })))
        .unwrap()
    }

    fn eval(source: &str) -> Value {
        let helpers = HelperRegistry::builtin();
        Evaluator::new(&helpers).evaluate(source, &ctx())
    }

    fn try_eval(source: &str) -> Result<Value> {
        let helpers = HelperRegistry::builtin();
        Evaluator::new(&helpers).try_evaluate(source, &ctx())
    }

    mod access {
        use super::*;

        #[test]
        fn variables_and_members() {
            assert_eq!(eval("name"), Value::from("Ada"));
            assert_eq!(eval(" user.name "), Value::from("Grace"));
            assert_eq!(eval("user.roles[1]"), Value::from("dev"));
            assert_eq!(eval("user['roles'].length"), Value::from(2));
            assert_eq!(eval("items[-1]"), Value::from(3));
            assert_eq!(eval("name[0]"), Value::from("A"));
        }

        #[test]
        fn misses_are_null_not_errors() {
            assert_eq!(try_eval("missing").unwrap(), Value::Null);
            assert_eq!(try_eval("missing.deep.path").unwrap(), Value::Null);
            assert_eq!(try_eval("items[10]").unwrap(), Value::Null);
            assert_eq!(try_eval("user?.nothing").unwrap(), Value::Null);
        }

        #[test]
        fn direct_keys_with_dots() {
            assert_eq!(eval("odd.key"), Value::from("direct"));
        }
    }

    mod operators {
        use super::*;

        #[test]
        fn ternary_and_coalesce() {
            assert_eq!(eval("qty > 1 ? 'many' : 'one'"), Value::from("many"));
            assert_eq!(eval("zero ? 'yes' : 'no'"), Value::from("no"));
            assert_eq!(eval("missing ?? 'none'"), Value::from("none"));
            assert_eq!(eval("zero ?? 5"), Value::from(0));
            assert_eq!(eval("empty ? 1 : 2"), Value::from(2));
        }

        #[test]
        fn logical_operators_return_deciding_operand() {
            assert_eq!(eval("name && qty"), Value::from(2));
            assert_eq!(eval("zero || 'fallback'"), Value::from("fallback"));
            assert_eq!(eval("zero && missing.call()"), Value::from(0));
            assert_eq!(eval("qty > 1 and name == 'Ada'"), Value::from(true));
            assert_eq!(eval("not zero"), Value::from(true));
        }

        #[test]
        fn arithmetic_and_concatenation() {
            assert_eq!(eval("price * qty"), Value::from(7.0));
            assert_eq!(eval("'Hi ' + name"), Value::from("Hi Ada"));
            assert_eq!(eval("2 in items"), Value::from(true));
            assert_eq!(eval("'root' not in user.roles"), Value::from(true));
        }

        #[test]
        fn literals() {
            assert_eq!(eval("[1, qty]"), Value::from(vec![1, 2]));
            assert_eq!(
                eval("{a: 1, 'b': name}"),
                Value::from(json!({"a": 1, "b": "Ada"}))
            );
            assert_eq!(eval("None ?? True"), Value::from(true));
        }
    }

    mod calls {
        use super::*;

        #[test]
        fn to_fixed_formats_decimals() {
            assert_eq!(eval("price.toFixed(2)"), Value::from("3.50"));
            assert_eq!(eval("qty.toFixed()"), Value::from("2"));
            assert_eq!(eval("(price * 3).toFixed(1)"), Value::from("10.5"));
        }

        #[test]
        fn to_fixed_on_missing_value_is_null() {
            assert_eq!(eval("missing.toFixed(2)"), Value::Null);
            assert_eq!(eval("format(missing, 2)"), Value::Null);
            assert!(try_eval("missing.toFixed(2)").is_err());
        }

        #[test]
        fn javascript_string_methods() {
            assert_eq!(eval("name.toUpperCase()"), Value::from("ADA"));
            assert_eq!(eval("user.roles.join(' / ')"), Value::from("admin / dev"));
            assert_eq!(eval("user.roles.includes('dev')"), Value::from(true));
            assert_eq!(eval("name.startsWith('A')"), Value::from(true));
            assert_eq!(eval("qty.toString()"), Value::from("2"));
        }

        #[test]
        fn helper_calls_and_methods() {
            assert_eq!(eval("upper(name)"), Value::from("ADA"));
            assert_eq!(eval("name.lower()"), Value::from("ada"));
            assert_eq!(eval("join(items, '-')"), Value::from("1-2-3"));
            assert_eq!(eval("divide(qty, zero)"), Value::from(0));
        }

        #[test]
        fn context_functions() {
            let helpers = HelperRegistry::new();
            let ctx = Context::new()
                .with_function("double", |args| {
                    Ok(Value::from(args[0].as_number().map_or(0.0, |n| n.to_f64()) * 2.0))
                })
                .with(
                    "obj",
                    Value::from(crate::value::Map::from_iter([(
                        "hello".to_string(),
                        Value::Function(crate::Function::new(|_| Ok(Value::from("hi")))),
                    )])),
                );
            let eval = Evaluator::new(&helpers);
            assert_eq!(eval.evaluate("double(4)", &ctx), Value::from(8));
            assert_eq!(eval.evaluate("obj.hello()", &ctx), Value::from("hi"));
        }

        #[test]
        fn unknown_function_is_null() {
            assert_eq!(try_eval("nope(1)").unwrap(), Value::Null);
        }

        #[test]
        fn unknown_method_is_an_error() {
            let err = try_eval("qty.nope()").unwrap_err();
            assert!(matches!(err, ExprError::UnknownMethod { .. }));
            assert_eq!(eval("qty.nope()"), Value::Null);
        }

        #[test]
        fn helper_errors_carry_name() {
            let err = try_eval("substr()").unwrap_err();
            assert!(matches!(err, ExprError::Helper { ref name, .. } if name == "substr"));
        }
    }

    mod fallback {
        use super::*;

        #[test]
        fn syntax_errors_degrade_to_null() {
            assert_eq!(eval("price +"), Value::Null);
            assert_eq!(eval("((("), Value::Null);
            assert_eq!(eval("a = b"), Value::Null);
            assert_eq!(eval(""), Value::Null);
        }

        #[test]
        fn type_errors_degrade_to_resolver() {
            assert_eq!(eval("name - 1"), Value::Null);
            assert_eq!(eval("qty / zero"), Value::Null);
        }
    }
}
