//! Error types for the expression crate.

use thiserror::Error;

/// Errors that can occur while parsing or evaluating an expression.
///
/// None of these reach template output directly: the [`Evaluator`](crate::Evaluator)
/// turns every failure into a resolver fallback. They are exposed for
/// [`Evaluator::try_evaluate`](crate::Evaluator::try_evaluate) and for tests.
#[derive(Debug, Error)]
pub enum ExprError {
    /// The expression text could not be tokenized or parsed.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Operator applied to operands it does not support.
    #[error("operator '{op}' is not valid for {left} and {right}")]
    InvalidOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// Unary operator applied to an unsupported operand.
    #[error("operator '{op}' is not valid for {operand}")]
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },

    /// Integer or float division (or modulo) by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Method call on a receiver that has no such method.
    #[error("unknown method '{method}' on {receiver}")]
    UnknownMethod {
        method: String,
        receiver: &'static str,
    },

    /// A helper function reported a failure.
    #[error("helper '{name}' failed: {source}")]
    Helper {
        name: String,
        #[source]
        source: HelperError,
    },
}

impl ExprError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        ExprError::Syntax {
            offset,
            message: message.into(),
        }
    }
}

/// Errors reported by helper functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HelperError {
    /// Wrong number of arguments.
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: String, got: usize },

    /// An argument had the wrong type or an unusable value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl HelperError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        HelperError::InvalidArgument(message.into())
    }
}

/// Result type for expression operations.
pub type Result<T> = std::result::Result<T, ExprError>;

/// Result type returned by helper functions.
pub type HelperResult = std::result::Result<crate::Value, HelperError>;
