//! Unary and binary operators of the expression language.
//!
//! Logical `&&`/`||` are listed here for display and parsing but are
//! evaluated with short-circuiting by the evaluator, not by [`BinaryOp::apply`].

use std::cmp::Ordering;

use crate::error::{ExprError, Result};
use crate::value::{Number, Value};

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    // Equality and ordering
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Membership
    In,
    NotIn,

    // Logical (short-circuit)
    And,
    Or,
}

impl BinaryOp {
    /// Returns the surface syntax of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::NotIn => "not in",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Applies a non-logical operator to two evaluated operands.
    pub fn apply(self, left: &Value, right: &Value) -> Result<Value> {
        match self {
            BinaryOp::Add => self.add(left, right),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                match (left, right) {
                    (Value::Number(a), Value::Number(b)) => self.arithmetic(*a, *b),
                    _ => Err(self.invalid(left, right)),
                }
            }
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::Ne => Ok(Value::Bool(left != right)),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => left
                .compare(right)
                .map(|ordering| Value::Bool(self.eval_ordering(ordering)))
                .ok_or_else(|| self.invalid(left, right)),
            BinaryOp::In => self.contains(left, right).map(Value::Bool),
            BinaryOp::NotIn => self.contains(left, right).map(|found| Value::Bool(!found)),
            BinaryOp::And | BinaryOp::Or => Err(self.invalid(left, right)),
        }
    }

    fn add(self, left: &Value, right: &Value) -> Result<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => self.arithmetic(*a, *b),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            (Value::Seq(a), Value::Seq(b)) => {
                Ok(Value::Seq(a.iter().chain(b.iter()).cloned().collect()))
            }
            _ => Err(self.invalid(left, right)),
        }
    }

    fn arithmetic(self, a: Number, b: Number) -> Result<Value> {
        if let (Number::Int(x), Number::Int(y)) = (a, b) {
            let exact = match self {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Sub => x.checked_sub(y),
                BinaryOp::Mul => x.checked_mul(y),
                BinaryOp::Rem if y == 0 => return Err(ExprError::DivisionByZero),
                BinaryOp::Rem => x.checked_rem(y),
                _ => None,
            };
            if let Some(n) = exact {
                return Ok(Value::Number(Number::Int(n)));
            }
        }

        let (x, y) = (a.to_f64(), b.to_f64());
        let result = match self {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div | BinaryOp::Rem if y == 0.0 => return Err(ExprError::DivisionByZero),
            BinaryOp::Div => x / y,
            BinaryOp::Rem => x % y,
            _ => {
                return Err(ExprError::InvalidOperands {
                    op: self.as_str(),
                    left: "number",
                    right: "number",
                })
            }
        };
        Ok(Value::Number(Number::Float(result)))
    }

    fn contains(self, needle: &Value, haystack: &Value) -> Result<bool> {
        match haystack {
            Value::Seq(items) => Ok(items.contains(needle)),
            Value::Map(map) => Ok(map.contains_key(&needle.to_string())),
            Value::String(s) => match needle {
                Value::String(sub) => Ok(s.contains(sub.as_str())),
                _ => Err(self.invalid(needle, haystack)),
            },
            _ => Err(self.invalid(needle, haystack)),
        }
    }

    fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Le => ordering != Ordering::Greater,
            BinaryOp::Gt => ordering == Ordering::Greater,
            BinaryOp::Ge => ordering != Ordering::Less,
            _ => false,
        }
    }

    fn invalid(self, left: &Value, right: &Value) -> ExprError {
        ExprError::InvalidOperands {
            op: self.as_str(),
            left: left.type_name(),
            right: right.type_name(),
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical negation (`!x`, `not x`).
    Not,
    /// Arithmetic negation.
    Neg,
    /// Numeric identity (`+x`).
    Plus,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
        }
    }

    pub fn apply(self, operand: &Value) -> Result<Value> {
        match (self, operand) {
            (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
            (UnaryOp::Neg, Value::Number(Number::Int(n))) => Ok(n
                .checked_neg()
                .map_or(Value::from(-(*n as f64)), Value::from)),
            (UnaryOp::Neg, Value::Number(Number::Float(x))) => Ok(Value::from(-x)),
            (UnaryOp::Plus, Value::Number(n)) => Ok(Value::Number(*n)),
            _ => Err(ExprError::InvalidOperand {
                op: self.as_str(),
                operand: operand.type_name(),
            }),
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
