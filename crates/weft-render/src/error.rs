//! Error types for template rendering.
//!
//! Almost nothing in a render is an error: unknown names, broken expressions
//! and unmatched tags all degrade in place. [`RenderError`] covers what is
//! left, the failures that abort the whole render and become a diagnostic
//! comment from [`Engine::render`](crate::Engine::render).

use thiserror::Error;
use weft_expr::ExprError;

/// Error type for rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Directive elements nested deeper than the configured limit.
    #[error("directive nesting exceeds maximum depth of {max}")]
    DepthExceeded { max: usize },

    /// The directive passes kept changing the document.
    #[error("template did not stabilize after {passes} passes")]
    NoFixedPoint { passes: usize },

    /// Render data could not be turned into a context.
    #[error("invalid render data: {0}")]
    Data(#[from] serde_json::Error),

    /// An expression failed where no fallback applies.
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// A helper or bound function panicked.
    #[error("panic during render: {0}")]
    Panic(String),
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RenderError::DepthExceeded { max: 64 };
        assert_eq!(err.to_string(), "directive nesting exceeds maximum depth of 64");

        let err = RenderError::NoFixedPoint { passes: 3 };
        assert!(err.to_string().contains("3 passes"));
    }

    #[test]
    fn test_from_expr_error() {
        let err: RenderError = ExprError::DivisionByZero.into();
        assert!(matches!(err, RenderError::Expr(_)));
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: RenderError = json_err.into();
        assert!(matches!(err, RenderError::Data(_)));
    }
}
