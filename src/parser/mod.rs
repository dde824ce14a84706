//! Parser module - converts strings to expressions
mod lexer;
mod pratt;

use crate::core::{CasError, Expr, Namespace};

/// Parse a formula string with the standard namespace
///
/// The text form is the one produced by `Display`, so
/// `parse(&e.to_string())` gives back `e` for any parsed `e`.
///
/// # Example
/// ```
/// use symb_algebra::parse;
///
/// let expr = parse("x^2 + 2*x + 1").unwrap();
/// assert_eq!(parse(&expr.to_string()).unwrap(), expr);
/// ```
///
/// # Errors
/// Returns `CasError` if:
/// - The input is empty
/// - The input contains invalid syntax or characters
/// - A matrix literal has rows of different lengths
/// - A call matches several overloads
pub fn parse(input: &str) -> Result<Expr, CasError> {
    parse_with(input, &Namespace::standard())
}

/// Parse a formula string resolving names through `namespace`
///
/// Names bound in the namespace become their values, other names become
/// variables. Calls resolve by name and argument count; a call to an unknown
/// name becomes an opaque function of that arity.
///
/// # Errors
/// See [`parse`].
pub fn parse_with(input: &str, namespace: &Namespace) -> Result<Expr, CasError> {
    // Pipeline: validate -> lex -> parse
    if input.trim().is_empty() {
        return Err(CasError::EmptyExpression);
    }

    let tokens = lexer::lex(input)?;
    pratt::parse_expression(&tokens, namespace)
}
