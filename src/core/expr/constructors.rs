//! Expression constructors.
//!
//! The `sum`/`product` constructors are the canonicalizing smart constructors:
//! they flatten, drop identity elements and sort. Everything else builds the
//! node as given.

use std::sync::Arc;

use super::{BinaryOp, Condition, Expr, ExprKind, Function, Ring, UnaryOp, Variable};
use super::{compute_expr_hash, expr_cmp};
use crate::core::error::CasError;
use crate::core::real::Real;

impl Expr {
    /// Create a new expression from its kind
    #[must_use]
    pub fn new(kind: ExprKind) -> Self {
        let hash = compute_expr_hash(&kind);
        Self { hash, kind }
    }

    /// Get the structural hash of the expression
    #[inline]
    #[must_use]
    pub const fn structural_hash(&self) -> u64 {
        self.hash
    }

    /// Borrow the node kind
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// Unwrap an `Arc<Expr>` without cloning if refcount is 1
    #[inline]
    #[must_use]
    pub fn unwrap_arc(arc: Arc<Self>) -> Self {
        Arc::try_unwrap(arc).unwrap_or_else(|a| (*a).clone())
    }

    // -------------------------------------------------------------------------
    // Accessor methods
    // -------------------------------------------------------------------------

    /// The value of a constant node
    #[inline]
    #[must_use]
    pub const fn as_constant(&self) -> Option<&Real> {
        match &self.kind {
            ExprKind::Constant(r) => Some(r),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_variable(&self) -> Option<&Variable> {
        match &self.kind {
            ExprKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self.kind, ExprKind::Constant(_))
    }

    /// True for the exact constant 0
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.as_constant().is_some_and(Real::is_zero)
    }

    /// True for the exact constant 1
    #[inline]
    #[must_use]
    pub fn is_one(&self) -> bool {
        self.as_constant().is_some_and(Real::is_one)
    }

    #[inline]
    #[must_use]
    pub fn is_minus_one(&self) -> bool {
        self.as_constant().is_some_and(Real::is_minus_one)
    }

    /// True for an exact integer constant
    #[inline]
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.as_constant().is_some_and(Real::is_integer)
    }

    /// Truth value of a constant (non-zero is true)
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_constant().map(|c| !c.is_zero())
    }

    /// Left and right side of an `a -> b` node
    #[must_use]
    pub fn as_arrow(&self) -> Option<(&Self, &Self)> {
        match &self.kind {
            ExprKind::Binary {
                op: BinaryOp::Arrow,
                left,
                right,
            } => Some((left, right)),
            _ => None,
        }
    }

    /// Left and right side of an `a == b` node
    #[must_use]
    pub fn as_equation(&self) -> Option<(&Self, &Self)> {
        match &self.kind {
            ExprKind::Binary {
                op: BinaryOp::Equal,
                left,
                right,
            } => Some((left, right)),
            _ => None,
        }
    }

    /// Members of a set, or the expression itself as a one-element list
    #[must_use]
    pub fn set_members(&self) -> Vec<Self> {
        match &self.kind {
            ExprKind::Set(members) => members.iter().map(|m| (**m).clone()).collect(),
            _ => vec![self.clone()],
        }
    }

    // -------------------------------------------------------------------------
    // Atoms
    // -------------------------------------------------------------------------

    /// Create a constant
    #[must_use]
    pub fn constant(value: impl Into<Real>) -> Self {
        Self::new(ExprKind::Constant(value.into()))
    }

    /// Create an exact integer constant
    #[must_use]
    pub fn integer(n: i64) -> Self {
        Self::constant(Real::from_i64(n))
    }

    /// Create the exact fraction `numer / denom`
    #[must_use]
    pub fn rational(numer: i64, denom: i64) -> Self {
        Self::constant(Real::from_ratio(numer, denom))
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::integer(0)
    }

    #[must_use]
    pub fn one() -> Self {
        Self::integer(1)
    }

    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::integer(i64::from(value))
    }

    /// Create a real-valued variable
    #[must_use]
    pub fn variable(name: &str) -> Self {
        Self::new(ExprKind::Variable(Variable::new(name, Ring::Reals)))
    }

    /// Create a variable ranging over `ring`
    #[must_use]
    pub fn variable_in(name: &str, ring: Ring) -> Self {
        Self::new(ExprKind::Variable(Variable::new(name, ring)))
    }

    /// Create a pattern variable that only matches expressions accepted by `condition`
    #[must_use]
    pub fn pattern_variable(
        name: &str,
        ring: Ring,
        condition: impl Fn(&Self) -> bool + Send + Sync + 'static,
    ) -> Self {
        let condition: Condition = Arc::new(condition);
        Self::new(ExprKind::Variable(Variable::with_condition(
            name, ring, condition,
        )))
    }

    /// Create a function call
    #[must_use]
    pub fn call(function: Arc<Function>, args: Vec<Self>) -> Self {
        Self::new(ExprKind::Call {
            function,
            args: args.into_iter().map(Arc::new).collect(),
        })
    }

    /// Create a call to an opaque function, `f[args]`
    #[must_use]
    pub fn unknown_call(name: &str, args: Vec<Self>) -> Self {
        let function = Arc::new(Function::unknown(name, args.len()));
        Self::call(function, args)
    }

    /// Create a matrix from rows of equal length
    ///
    /// # Errors
    /// `DimensionMismatch` when the rows are ragged.
    pub fn matrix(rows: Vec<Vec<Self>>) -> Result<Self, CasError> {
        let cols = rows.first().map_or(0, Vec::len);
        let row_count = rows.len();
        let mut elements = Vec::with_capacity(row_count * cols);
        for row in rows {
            if row.len() != cols {
                return Err(CasError::DimensionMismatch {
                    expected: (row_count, cols),
                    got: (row_count, row.len()),
                });
            }
            elements.extend(row.into_iter().map(Arc::new));
        }
        Ok(Self::matrix_from_arcs(row_count, cols, elements))
    }

    /// Create a `rows x cols` matrix with elements `f(i, j)`
    #[must_use]
    pub fn matrix_from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Self) -> Self {
        let mut elements = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                elements.push(Arc::new(f(i, j)));
            }
        }
        Self::matrix_from_arcs(rows, cols, elements)
    }

    pub(crate) fn matrix_from_arcs(rows: usize, cols: usize, elements: Vec<Arc<Self>>) -> Self {
        debug_assert_eq!(rows * cols, elements.len());
        Self::new(ExprKind::Matrix {
            rows,
            cols,
            elements,
        })
    }

    /// Create an index expression, `target[indices]`
    #[must_use]
    pub fn index(target: Self, indices: Vec<Self>) -> Self {
        Self::new(ExprKind::Index {
            target: Arc::new(target),
            indices: indices.into_iter().map(Arc::new).collect(),
        })
    }

    // -------------------------------------------------------------------------
    // Sum / Product
    // -------------------------------------------------------------------------

    /// Create a canonical sum.
    ///
    /// Nested sums are flattened, zero terms dropped and the remaining terms
    /// sorted by [`expr_cmp`]. No terms gives `0`, a single term is returned as is.
    #[must_use]
    pub fn sum(terms: Vec<Self>) -> Self {
        Self::sum_from_arcs(terms.into_iter().map(Arc::new).collect())
    }

    /// Create a canonical sum from Arc terms
    #[must_use]
    pub fn sum_from_arcs(terms: Vec<Arc<Self>>) -> Self {
        let mut flat: Vec<Arc<Self>> = Vec::with_capacity(terms.len());
        for t in terms {
            if let ExprKind::Sum(inner) = &t.kind {
                flat.extend(inner.iter().cloned());
            } else if !t.is_zero() {
                flat.push(t);
            }
        }

        match flat.len() {
            0 => Self::zero(),
            1 => flat.pop().map_or_else(Self::zero, Self::unwrap_arc),
            _ => {
                flat.sort_by(|a, b| expr_cmp(a, b));
                Self::new(ExprKind::Sum(flat))
            }
        }
    }

    /// Create a canonical product.
    ///
    /// Nested products are flattened, unit factors dropped and the remaining
    /// factors sorted. Any exact zero factor makes the whole product `0`.
    #[must_use]
    pub fn product(factors: Vec<Self>) -> Self {
        Self::product_from_arcs(factors.into_iter().map(Arc::new).collect())
    }

    /// Create a canonical product from Arc factors
    #[must_use]
    pub fn product_from_arcs(factors: Vec<Arc<Self>>) -> Self {
        let mut flat: Vec<Arc<Self>> = Vec::with_capacity(factors.len());
        for f in factors {
            if let ExprKind::Product(inner) = &f.kind {
                flat.extend(inner.iter().cloned());
            } else if f.is_zero() {
                return Self::zero();
            } else if !f.is_one() {
                flat.push(f);
            }
        }

        match flat.len() {
            0 => Self::one(),
            1 => flat.pop().map_or_else(Self::one, Self::unwrap_arc),
            _ => {
                flat.sort_by(|a, b| expr_cmp(a, b));
                Self::new(ExprKind::Product(flat))
            }
        }
    }

    /// `left + right`
    #[must_use]
    pub fn add_expr(left: Self, right: Self) -> Self {
        Self::sum(vec![left, right])
    }

    /// `left - right`, represented as `left + (-1)*right`
    #[must_use]
    pub fn sub_expr(left: Self, right: Self) -> Self {
        Self::sum(vec![left, right.negate()])
    }

    /// `left * right`
    #[must_use]
    pub fn mul_expr(left: Self, right: Self) -> Self {
        Self::product(vec![left, right])
    }

    /// `left / right`, represented as `left * right^-1`
    #[must_use]
    pub fn div_expr(left: Self, right: Self) -> Self {
        Self::product(vec![left, right.inverse()])
    }

    /// `-self`, represented as `(-1)*self`
    #[must_use]
    pub fn negate(self) -> Self {
        Self::product(vec![Self::integer(-1), self])
    }

    /// `self^-1`
    #[must_use]
    pub fn inverse(self) -> Self {
        Self::power(self, Self::integer(-1))
    }

    // -------------------------------------------------------------------------
    // Other composites
    // -------------------------------------------------------------------------

    /// Create `base ^ exponent`
    #[must_use]
    pub fn power(base: Self, exponent: Self) -> Self {
        Self::new(ExprKind::Power(Arc::new(base), Arc::new(exponent)))
    }

    /// Create a binary operator node
    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::new(ExprKind::Binary {
            op,
            left: Arc::new(left),
            right: Arc::new(right),
        })
    }

    /// Create a unary operator node
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Arc::new(operand),
        })
    }

    /// Create `left -> right`
    #[must_use]
    pub fn arrow(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Arrow, left, right)
    }

    /// Create `left == right`
    #[must_use]
    pub fn equal(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Equal, left, right)
    }

    /// Create a finite set; members are sorted and duplicates removed
    #[must_use]
    pub fn set(members: Vec<Self>) -> Self {
        let mut members: Vec<Arc<Self>> = members.into_iter().map(Arc::new).collect();
        members.sort_by(|a, b| expr_cmp(a, b));
        members.dedup();
        Self::new(ExprKind::Set(members))
    }
}

// Convert integers to constants
impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Self::integer(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Self::integer(i64::from(n))
    }
}

impl From<Real> for Expr {
    fn from(r: Real) -> Self {
        Self::constant(r)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::variable("x")
    }

    fn y() -> Expr {
        Expr::variable("y")
    }

    #[test]
    fn test_sum_flattens_and_sorts() {
        let inner = Expr::sum(vec![y(), Expr::integer(2)]);
        let outer = Expr::sum(vec![x(), inner]);
        match outer.kind() {
            ExprKind::Sum(terms) => {
                assert_eq!(terms.len(), 3);
                assert!(terms[0].is_constant());
            }
            other => panic!("expected sum, got {other:?}"),
        }
        assert_eq!(outer, Expr::sum(vec![y(), Expr::integer(2), x()]));
    }

    #[test]
    fn test_identities_collapse() {
        assert_eq!(Expr::sum(vec![]), Expr::zero());
        assert_eq!(Expr::product(vec![]), Expr::one());
        assert_eq!(Expr::sum(vec![x(), Expr::zero()]), x());
        assert_eq!(Expr::product(vec![x(), Expr::one()]), x());
        assert_eq!(Expr::product(vec![x(), Expr::zero()]), Expr::zero());
    }

    #[test]
    fn test_product_with_zero_short_circuits_unevaluable_factor() {
        let bad = Expr::power(Expr::zero(), Expr::integer(-1));
        assert_eq!(Expr::product(vec![bad, Expr::zero()]), Expr::zero());
    }

    #[test]
    fn test_set_dedups() {
        let s = Expr::set(vec![y(), x(), y()]);
        assert_eq!(s.set_members(), vec![x(), y()]);
    }

    #[test]
    fn test_ragged_matrix_is_rejected() {
        let m = Expr::matrix(vec![vec![x(), y()], vec![x()]]);
        assert!(matches!(m, Err(CasError::DimensionMismatch { .. })));
    }
}
