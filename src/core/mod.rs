//! Core types for symbolic computation
//!
//! This module contains the fundamental types:
//! - `Real` - exact rational / floating numeric tower
//! - `Expr` / `ExprKind` - immutable expression trees
//! - `Namespace` - explicit registry of named values and functions
//! - `CasError` / `EvalFault` - error types
//! - Display formatting and the visitor pattern for tree traversal

mod display; // Display implementations for Expr
pub(crate) mod error;
pub(crate) mod expr;
pub(crate) mod namespace;
pub(crate) mod real;
pub mod visitor; // Public visitor pattern

// Public re-exports (for external API)
pub use error::{CasError, EvalFault, Span};
pub use expr::{
    Atoms, BinaryOp, Condition, Expr, ExprKind, Function, FunctionBody, NativeFn, Ring, UnaryOp,
    Variable, factors_of, split_exponent, terms_of,
};
pub use namespace::Namespace;
pub use real::{APPROX_EQUAL_TOLERANCE, Real};
pub use visitor::{ExprVisitor, walk_expr};
