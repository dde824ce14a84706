//! Immutable expression trees.
//!
//! This module defines:
//! - `Expr` - the central tree node type
//! - `ExprKind` - the closed set of node kinds
//! - `Variable`, `Ring`, `BinaryOp`, `UnaryOp` - the payloads of atoms and operators
//!
//! # Architecture
//!
//! ## N-ary Sum/Product
//! `a + b + c` is `Sum([a, b, c])`, never a nest of binary additions. The
//! constructors flatten nested sums/products, drop identity elements and sort
//! operands into the canonical order, so two equivalent constructions yield
//! equal trees.
//!
//! ## Structural Hashing
//! Each `Expr` carries a pre-computed `hash` for O(1) equality rejection.
//! Evaluation caches and binding maps key on it.
//!
//! ## Atoms
//! Constants, variables, calls, matrices and indices are atoms: the leaves used
//! by dependency queries and by the fallback of the canonical ordering.
//! Sums, products, powers, sets and the generic operators are composites.
//!
//! # Usage
//!
//! ```
//! use symb_algebra::Expr;
//!
//! let x = Expr::variable("x");
//! let sum = Expr::sum(vec![x.clone(), Expr::integer(0), x]);
//! assert_eq!(sum.to_string(), "x + x");
//! ```

mod analysis;
mod constructors;
mod function;
mod hash;
mod ops;
mod ordering;

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, LazyLock};

use crate::core::real::Real;

pub use analysis::{Atoms, factors_of, split_exponent, terms_of};
pub use function::{Function, FunctionBody, NativeFn};
pub use hash::compute_expr_hash;
pub use ordering::{expr_cmp, fast_key};

/// Condition attached to a pattern variable
pub type Condition = Arc<dyn Fn(&Expr) -> bool + Send + Sync>;

// =============================================================================
// CACHED CONSTANTS
// =============================================================================

/// Cached Arc<Expr> for 0, used during Drop to swap out children without allocation
static DUMMY_ARC: LazyLock<Arc<Expr>> = LazyLock::new(|| Arc::new(Expr::integer(0)));

// =============================================================================
// EXPR - The main expression type
// =============================================================================

/// A symbolic expression.
///
/// Expressions are immutable once built. Children are shared through `Arc`, so
/// cloning an `Expr` never copies a subtree.
#[derive(Debug, Clone)]
pub struct Expr {
    /// Structural hash for O(1) equality rejection
    pub(crate) hash: u64,
    /// The kind of expression (structure)
    pub(crate) kind: ExprKind,
}

impl Deref for Expr {
    type Target = ExprKind;
    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

// Structural equality based on KIND only (with hash fast-reject)
impl PartialEq for Expr {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash {
            return false;
        }
        self.kind == other.kind
    }
}

impl Eq for Expr {}

impl std::hash::Hash for Expr {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        expr_cmp(self, other)
    }
}

// =============================================================================
// EXPRKIND
// =============================================================================

/// The kind (structure) of an expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Numeric leaf
    Constant(Real),

    /// Named variable, optionally a pattern variable with a matching condition
    Variable(Variable),

    /// Function call with ordered arguments
    Call {
        function: Arc<Function>,
        args: Vec<Arc<Expr>>,
    },

    /// Dense matrix, elements stored row-major
    Matrix {
        rows: usize,
        cols: usize,
        elements: Vec<Arc<Expr>>,
    },

    /// Subscripted target, `x[i, j]`
    Index {
        target: Arc<Expr>,
        indices: Vec<Arc<Expr>>,
    },

    /// N-ary sum: a + b + c + ...
    /// Stored flat and sorted into the canonical order.
    /// Subtraction is represented as: a - b = Sum([a, Product([-1, b])])
    Sum(Vec<Arc<Expr>>),

    /// N-ary product: a * b * c * ...
    /// Stored flat and sorted. Division is a / b = Product([a, Power(b, -1)])
    Product(Vec<Arc<Expr>>),

    /// Exponentiation (binary - not associative)
    Power(Arc<Expr>, Arc<Expr>),

    /// Generic binary operator (relational, logical, arrow, substitution)
    Binary {
        op: BinaryOp,
        left: Arc<Expr>,
        right: Arc<Expr>,
    },

    /// Generic unary operator
    Unary { op: UnaryOp, operand: Arc<Expr> },

    /// Finite set, members sorted and distinct
    Set(Vec<Arc<Expr>>),
}

impl ExprKind {
    /// True for nodes that are their own only atom
    #[inline]
    #[must_use]
    pub const fn is_atom(&self) -> bool {
        matches!(
            self,
            Self::Constant(_)
                | Self::Variable(_)
                | Self::Call { .. }
                | Self::Matrix { .. }
                | Self::Index { .. }
        )
    }
}

// =============================================================================
// OPERATORS
// =============================================================================

/// Operator tags of [`ExprKind::Binary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryOp {
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    ApproxEqual,
    /// `x -> y`, binding / substitution rule
    Arrow,
    /// `expr : rules`, apply the arrows on the right to the left side
    Substitute,
}

impl BinaryOp {
    /// The operator's text form
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::And => "&",
            Self::Or => "|",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::ApproxEqual => "~=",
            Self::Arrow => "->",
            Self::Substitute => ":",
        }
    }

    /// Binding power used by both the parser and the printer
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::And => 3,
            Self::Or => 4,
            Self::Arrow => 2,
            Self::Equal
            | Self::NotEqual
            | Self::Less
            | Self::LessEqual
            | Self::Greater
            | Self::GreaterEqual
            | Self::ApproxEqual
            | Self::Substitute => 1,
        }
    }

    #[must_use]
    pub const fn is_relational(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
                | Self::ApproxEqual
        )
    }
}

/// Operator tags of [`ExprKind::Unary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnaryOp {
    /// Logical negation, `!x`
    Not,
    /// Postfix prime, `x'`
    Prime,
}

impl UnaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Prime => "'",
        }
    }

    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Not => 3,
            Self::Prime => 9,
        }
    }
}

/// Precedence of atoms and other nodes that never need parentheses
pub const ATOM_PRECEDENCE: u8 = 100;
/// Precedence of `+` / `-`
pub const SUM_PRECEDENCE: u8 = 5;
/// Precedence of prefix `-`
pub const NEGATE_PRECEDENCE: u8 = 6;
/// Precedence of `*` / `/`
pub const PRODUCT_PRECEDENCE: u8 = 7;
/// Precedence of `^`
pub const POWER_PRECEDENCE: u8 = 8;

// =============================================================================
// VARIABLES AND RINGS
// =============================================================================

/// Domain a variable ranges over; restricts what a pattern variable may bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Ring {
    /// `0` (false) and `1` (true)
    Booleans,
    Integers,
    #[default]
    Reals,
}

impl Ring {
    /// Whether `e` is a member of the ring
    #[must_use]
    pub fn contains(self, e: &Expr) -> bool {
        match self {
            Self::Booleans => e
                .as_constant()
                .is_some_and(|c| c.is_zero() || c.is_one()),
            Self::Integers => e.as_constant().is_some_and(Real::is_integer),
            Self::Reals => true,
        }
    }
}

/// A named variable.
///
/// Every variable can act as a pattern variable during matching; a condition
/// further restricts what it may bind to.
#[derive(Clone)]
pub struct Variable {
    name: Arc<str>,
    key: u64,
    ring: Ring,
    condition: Option<Condition>,
}

impl Variable {
    #[must_use]
    pub fn new(name: &str, ring: Ring) -> Self {
        Self {
            key: fast_key(name),
            name: Arc::from(name),
            ring,
            condition: None,
        }
    }

    /// A variable that only matches expressions satisfying `condition`
    #[must_use]
    pub fn with_condition(name: &str, ring: Ring, condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..Self::new(name, ring)
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Packed leading characters used for fast ordering
    #[inline]
    #[must_use]
    pub const fn key(&self) -> u64 {
        self.key
    }

    #[inline]
    #[must_use]
    pub const fn ring(&self) -> Ring {
        self.ring
    }

    #[inline]
    #[must_use]
    pub const fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    /// Address of the condition closure, 0 without one
    pub(crate) fn condition_addr(&self) -> usize {
        self.condition
            .as_ref()
            .map_or(0, |c| Arc::as_ptr(c).cast::<()>() as usize)
    }

    /// Whether this variable may bind to `e`
    #[must_use]
    pub fn admits(&self, e: &Expr) -> bool {
        self.ring.contains(e) && self.condition.as_ref().is_none_or(|cond| cond(e))
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.name == other.name
            && self.ring == other.ring
            && match (&self.condition, &other.condition) {
                (None, None) => true,
                (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
                _ => false,
            }
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("ring", &self.ring)
            .field("condition", &self.condition.is_some())
            .finish()
    }
}

// =============================================================================
// DROP IMPLEMENTATION - Iterative drop to prevent stack overflow
// =============================================================================

impl Drop for Expr {
    fn drop(&mut self) {
        fn drain_children(kind: &mut ExprKind, queue: &mut Vec<Arc<Expr>>) {
            match kind {
                ExprKind::Call { args: children, .. }
                | ExprKind::Matrix {
                    elements: children, ..
                }
                | ExprKind::Sum(children)
                | ExprKind::Product(children)
                | ExprKind::Set(children) => {
                    queue.extend(std::mem::take(children));
                }
                ExprKind::Index { target, indices } => {
                    queue.push(std::mem::replace(target, Arc::clone(&DUMMY_ARC)));
                    queue.extend(std::mem::take(indices));
                }
                ExprKind::Power(left, right) | ExprKind::Binary { left, right, .. } => {
                    queue.push(std::mem::replace(left, Arc::clone(&DUMMY_ARC)));
                    queue.push(std::mem::replace(right, Arc::clone(&DUMMY_ARC)));
                }
                ExprKind::Unary { operand, .. } => {
                    queue.push(std::mem::replace(operand, Arc::clone(&DUMMY_ARC)));
                }
                ExprKind::Constant(_) | ExprKind::Variable(_) => {}
            }
        }

        if matches!(self.kind, ExprKind::Constant(_) | ExprKind::Variable(_)) {
            return;
        }

        let mut work_queue = Vec::new();
        drain_children(&mut self.kind, &mut work_queue);

        while let Some(arc) = work_queue.pop() {
            // Only the last owner tears the node down; shared subtrees stay alive
            if let Ok(mut expr) = Arc::try_unwrap(arc) {
                drain_children(&mut expr.kind, &mut work_queue);
            }
        }
    }
}
