//! One row of a linear system: coefficients over a basis of unknowns

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::core::{CasError, Expr, terms_of};
use crate::evaluate::{Evaluator, expand};

/// Sparse map from basis expression to coefficient.
///
/// The constant `1` is an implicit basis element holding the terms that do not
/// depend linearly on any unknown. Absent entries are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCombination {
    basis: Vec<Expr>,
    terms: IndexMap<Expr, Expr, FxBuildHasher>,
}

impl LinearCombination {
    /// An empty (zero) combination over `basis`
    #[must_use]
    pub fn new(basis: &[Expr]) -> Self {
        Self {
            basis: basis.to_vec(),
            terms: IndexMap::default(),
        }
    }

    /// Decompose `expr` over `basis`.
    ///
    /// `expr` is expanded first. A term `t` goes to the first basis element `b`
    /// for which `t/b` no longer depends on the basis; any other term goes to the
    /// constant slot, so non-linear terms end up there.
    ///
    /// # Example
    /// ```
    /// use symb_algebra::{Expr, LinearCombination, parse};
    ///
    /// let x = Expr::variable("x");
    /// let row = LinearCombination::from_expr(&[x.clone()], &parse("a*x + 2*x - b").unwrap());
    /// assert_eq!(row.coefficient(&x), symb_algebra::evaluate(&parse("a + 2").unwrap()));
    /// assert_eq!(row.coefficient(&Expr::one()), symb_algebra::evaluate(&parse("-b").unwrap()));
    /// ```
    #[must_use]
    pub fn from_expr(basis: &[Expr], expr: &Expr) -> Self {
        let mut row = Self::new(basis);
        let mut evaluator = Evaluator::new();
        for t in terms_of(&expand(expr)) {
            row.add_term_with(t, &mut evaluator);
        }
        row
    }

    #[must_use]
    pub fn basis(&self) -> &[Expr] {
        &self.basis
    }

    /// The coefficient of `b` (zero when absent); `Expr::one()` selects the constant slot
    #[must_use]
    pub fn coefficient(&self, b: &Expr) -> Expr {
        self.terms.get(b).cloned().unwrap_or_else(Expr::zero)
    }

    /// Non-zero entries, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Expr, &Expr)> {
        self.terms.iter()
    }

    /// True when every coefficient is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Add one term of a sum, classifying it by basis element
    pub fn add_term(&mut self, t: &Expr) {
        self.add_term_with(t, &mut Evaluator::new());
    }

    fn add_term_with(&mut self, t: &Expr, evaluator: &mut Evaluator) {
        if t.depends_on_any(&self.basis) {
            for b in &self.basis {
                let tb = evaluator.evaluate(&Expr::div_expr(t.clone(), b.clone()));
                if !tb.depends_on_any(&self.basis) {
                    let b = b.clone();
                    self.add_to(b, &tb, evaluator);
                    return;
                }
            }
        }
        self.add_to(Expr::one(), t, evaluator);
    }

    /// `self[b] += value`
    fn add_to(&mut self, b: Expr, value: &Expr, evaluator: &mut Evaluator) {
        let sum = evaluator.evaluate(&Expr::add_expr(self.coefficient(&b), value.clone()));
        self.set(b, sum);
    }

    /// Set a coefficient; zero removes the entry
    pub fn set(&mut self, b: Expr, value: Expr) {
        if value.is_zero() {
            self.terms.shift_remove(&b);
        } else {
            self.terms.insert(b, value);
        }
    }

    /// `self += other * factor`
    pub fn add_scaled(&mut self, other: &Self, factor: &Expr) {
        let mut evaluator = Evaluator::new();
        for (b, c) in &other.terms {
            let scaled = evaluator.evaluate(&Expr::mul_expr(c.clone(), factor.clone()));
            self.add_to(b.clone(), &scaled, &mut evaluator);
        }
    }

    /// `self *= factor`
    pub fn scale(&mut self, factor: &Expr) {
        let mut evaluator = Evaluator::new();
        let scaled: Vec<(Expr, Expr)> = self
            .terms
            .iter()
            .map(|(b, c)| {
                (
                    b.clone(),
                    evaluator.evaluate(&Expr::mul_expr(c.clone(), factor.clone())),
                )
            })
            .collect();
        self.terms.clear();
        for (b, c) in scaled {
            self.set(b, c);
        }
    }

    /// Solve `self == 0` for `x`: `-(sum of the other entries) / self[x]`
    ///
    /// # Errors
    /// `UnknownNotInRow` when the coefficient of `x` is zero.
    pub fn solve_for(&self, x: &Expr) -> Result<Expr, CasError> {
        let pivot = self
            .terms
            .get(x)
            .ok_or_else(|| CasError::UnknownNotInRow {
                unknown: x.to_string(),
            })?;
        let rest = Expr::sum(
            self.terms
                .iter()
                .filter(|(b, _)| *b != x)
                .map(|(b, c)| Expr::mul_expr(b.clone(), c.clone()))
                .collect(),
        );
        Ok(Evaluator::new().evaluate(&Expr::div_expr(rest.negate(), pivot.clone())))
    }

    /// Whether any entry involves one of `xs`, as a basis element or inside a coefficient
    #[must_use]
    pub fn depends_on(&self, xs: &[Expr]) -> bool {
        self.terms
            .iter()
            .any(|(b, c)| xs.contains(b) || c.depends_on_any(xs))
    }

    /// The combination as an evaluated expression, `sum of b * self[b]`
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        Evaluator::new().evaluate(&Expr::sum(
            self.terms
                .iter()
                .map(|(b, c)| Expr::mul_expr(b.clone(), c.clone()))
                .collect(),
        ))
    }
}

impl std::fmt::Display for LinearCombination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} == 0", self.to_expr())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::evaluate::evaluate;
    use crate::parser::parse;

    fn eval(input: &str) -> Expr {
        evaluate(&parse(input).unwrap())
    }

    fn xy() -> Vec<Expr> {
        vec![Expr::variable("x"), Expr::variable("y")]
    }

    #[test]
    fn test_decomposition() {
        let row = LinearCombination::from_expr(&xy(), &parse("2*x + a*y - 3*(y - c)").unwrap());
        assert_eq!(row.coefficient(&Expr::variable("x")), Expr::integer(2));
        assert_eq!(row.coefficient(&Expr::variable("y")), eval("a - 3"));
        assert_eq!(row.coefficient(&Expr::one()), eval("3*c"));
    }

    #[test]
    fn test_nonlinear_terms_go_to_constant_slot() {
        let row = LinearCombination::from_expr(&xy(), &parse("x*y + x").unwrap());
        assert_eq!(row.coefficient(&Expr::variable("x")), Expr::one());
        assert_eq!(row.coefficient(&Expr::one()), eval("x*y"));
        assert!(row.depends_on(&[Expr::variable("y")]));
    }

    #[test]
    fn test_solve_for() {
        let row = LinearCombination::from_expr(&xy(), &parse("2*x + 4*y - 8").unwrap());
        assert_eq!(row.solve_for(&Expr::variable("x")).unwrap(), eval("4 - 2*y"));
        let missing = LinearCombination::from_expr(&xy(), &parse("y - 1").unwrap());
        assert!(matches!(
            missing.solve_for(&Expr::variable("x")),
            Err(CasError::UnknownNotInRow { .. })
        ));
    }

    #[test]
    fn test_add_scaled_cancels() {
        let mut a = LinearCombination::from_expr(&xy(), &parse("2*x + y").unwrap());
        let b = LinearCombination::from_expr(&xy(), &parse("x - y").unwrap());
        a.add_scaled(&b, &Expr::integer(-2));
        assert_eq!(a.coefficient(&Expr::variable("x")), Expr::zero());
        assert_eq!(a.coefficient(&Expr::variable("y")), Expr::integer(3));
        a.scale(&Expr::rational(1, 3));
        assert_eq!(a.to_expr(), Expr::variable("y"));
    }
}
