use std::fmt;

use thiserror::Error;

/// Source location span for error reporting
/// Represents a range of characters in the input string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position (0-indexed byte offset)
    pub start: usize,
    /// End position (exclusive, 0-indexed byte offset)
    pub end: usize,
}

impl Span {
    /// Create a new span
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a span for a single position
    #[must_use]
    pub const fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Check if this span has valid location info
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.end > self.start
    }
}

/// Formats the span for messages (1-indexed for users)
impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            Ok(())
        } else if self.end - self.start == 1 {
            write!(f, " at position {}", self.start + 1)
        } else {
            write!(f, " at positions {}-{}", self.start + 1, self.end)
        }
    }
}

fn span_suffix(span: Option<&Span>) -> String {
    span.map(ToString::to_string).unwrap_or_default()
}

/// Errors raised to the caller.
///
/// Construction, matching and evaluation never produce these; they come from
/// parsing, name resolution, shape-checked matrix operations and malformed
/// solver input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CasError {
    // Parsing errors
    #[error("Expression cannot be empty")]
    EmptyExpression,
    #[error("Invalid number format: '{value}'{}", span_suffix(.span.as_ref()))]
    InvalidNumber { value: String, span: Option<Span> },
    #[error("Invalid token: '{token}'{}", span_suffix(.span.as_ref()))]
    InvalidToken { token: String, span: Option<Span> },
    #[error("Expected {expected}, but got {got}{}", span_suffix(.span.as_ref()))]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Option<Span>,
    },
    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,

    // Name resolution
    #[error("Unresolved name '{name}'")]
    UnresolvedName { name: String },
    #[error("Ambiguous name '{name}': {candidates} candidates")]
    AmbiguousName { name: String, candidates: usize },

    // Shape errors
    #[error("Dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .got.0, .got.1)]
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("Matrix is not square ({rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },
    #[error("Singular matrix")]
    SingularMatrix,

    // Solver input
    #[error("Not an equation: {expr}")]
    NotAnEquation { expr: String },
    #[error("Unknown '{unknown}' does not appear in the equation")]
    UnknownNotInRow { unknown: String },
}

/// A fault raised by a native function during evaluation.
///
/// The evaluator records these and leaves the offending call symbolic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalFault {
    /// Name of the function that raised
    pub function: String,
    /// The function's message
    pub message: String,
}

impl fmt::Display for EvalFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.function, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_spans() {
        let err = CasError::InvalidToken {
            token: "$".to_string(),
            span: Some(Span::at(3)),
        };
        assert_eq!(err.to_string(), "Invalid token: '$' at position 4");

        let err = CasError::UnexpectedToken {
            expected: ")".to_string(),
            got: "end of input".to_string(),
            span: None,
        };
        assert_eq!(err.to_string(), "Expected ), but got end of input");
    }

    #[test]
    fn test_dimension_message() {
        let err = CasError::DimensionMismatch {
            expected: (2, 2),
            got: (2, 3),
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 2x2, got 2x3");
    }
}
