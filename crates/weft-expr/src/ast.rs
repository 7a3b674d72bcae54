//! Typed syntax tree for expressions.

use crate::op::{BinaryOp, UnaryOp};
use crate::value::Value;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal scalar (`1`, `'x'`, `true`, `null`).
    Literal(Value),
    /// Bare variable name.
    Var(String),
    /// Array literal `[a, b]`.
    Array(Vec<Expr>),
    /// Object literal `{key: value}`.
    Object(Vec<(String, Expr)>),
    /// Member access `target.name`.
    Member(Box<Expr>, String),
    /// Index access `target[index]`.
    Index(Box<Expr>, Box<Expr>),
    /// Call of a named function: `name(args)`.
    Call(String, Vec<Expr>),
    /// Method call `receiver.name(args)`.
    MethodCall(Box<Expr>, String, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `cond ? then : otherwise`
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    /// `left ?? right`
    Coalesce(Box<Expr>, Box<Expr>),
}
