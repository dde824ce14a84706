//! Linear equation solver
//!
//! Equations are decomposed into [`LinearCombination`] rows over the unknowns,
//! row reduced with pivot scoring, optionally back substituted, and solved for
//! as many unknowns as possible. Coefficients may be symbolic.
//!
//! # Example
//! ```
//! use symb_algebra::{Expr, parse, solve};
//!
//! let equations = [parse("2*x + 4*y == 8").unwrap(), parse("x == 2*y + 3").unwrap()];
//! let unknowns = [Expr::variable("x"), Expr::variable("y")];
//! let solutions = solve(&equations, &unknowns).unwrap();
//! assert_eq!(solutions[0].to_string(), "x -> 3.5");
//! ```

mod linear_combination;
mod system;

pub use linear_combination::LinearCombination;
pub use system::SystemOfEquations;

use tracing::debug;

use crate::core::{CasError, Expr};

/// Builder for solving operations
#[derive(Debug, Clone)]
pub struct Solver {
    back_substitute: bool,
    full_pivoting: bool,
    partition: bool,
    pivot_conditions: Vec<Expr>,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            back_substitute: true,
            full_pivoting: true,
            partition: false,
            pivot_conditions: Vec::new(),
        }
    }
}

impl Solver {
    /// Create a solver with back substitution and full pivoting
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run back substitution before extracting solutions.
    ///
    /// Without it, a solution may depend on unknowns extracted before it.
    #[must_use]
    pub const fn back_substitute(mut self, enabled: bool) -> Self {
        self.back_substitute = enabled;
        self
    }

    /// Choose pivots from every remaining column instead of the current one
    #[must_use]
    pub const fn full_pivoting(mut self, enabled: bool) -> Self {
        self.full_pivoting = enabled;
        self
    }

    /// Solve independent sub-systems separately
    #[must_use]
    pub const fn partition(mut self, enabled: bool) -> Self {
        self.partition = enabled;
        self
    }

    /// Arrows substituted into coefficients when scoring pivots, e.g. `a -> 0`
    /// when `a` is known to be small
    #[must_use]
    pub fn pivot_conditions(mut self, arrows: Vec<Expr>) -> Self {
        self.pivot_conditions = arrows;
        self
    }

    /// Solve `equations` for `unknowns`, returning `unknown -> solution` arrows.
    ///
    /// Unknowns that cannot be solved for are simply absent from the result.
    ///
    /// # Errors
    /// `NotAnEquation` when an equation is a non-equality relation, arrow,
    /// logical operator or set.
    pub fn solve(&self, equations: &[Expr], unknowns: &[Expr]) -> Result<Vec<Expr>, CasError> {
        let system = SystemOfEquations::new(equations, unknowns)?;
        if !self.partition {
            return Ok(self.solve_system(system));
        }
        Ok(system
            .partition()
            .into_iter()
            .flat_map(|part| self.solve_system(part))
            .collect())
    }

    fn solve_system(&self, mut system: SystemOfEquations) -> Vec<Expr> {
        system.row_reduce(self.full_pivoting, &self.pivot_conditions);
        if self.back_substitute {
            system.back_substitute();
        }
        let solutions = system.solve();
        debug!(
            solved = solutions.len(),
            remaining = system.unknowns().len(),
            "solver finished"
        );
        solutions
    }
}

/// Solve a linear system with full pivoting and back substitution
///
/// # Errors
/// `NotAnEquation` for malformed equations.
pub fn solve(equations: &[Expr], unknowns: &[Expr]) -> Result<Vec<Expr>, CasError> {
    Solver::new().solve(equations, unknowns)
}

/// Row reduce and extract without back substitution.
///
/// Solutions come out in triangular form: each may depend on unknowns that
/// appear earlier in the result.
///
/// # Errors
/// `NotAnEquation` for malformed equations.
pub fn partial_solve(equations: &[Expr], unknowns: &[Expr]) -> Result<Vec<Expr>, CasError> {
    Solver::new().back_substitute(false).solve(equations, unknowns)
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

    fn equations(list: &[&str]) -> Vec<Expr> {
        list.iter().map(|e| parse(e).unwrap()).collect()
    }

    fn vars(names: &[&str]) -> Vec<Expr> {
        names.iter().map(|n| Expr::variable(n)).collect()
    }

    fn arrow(x: &str, value: &str) -> Expr {
        Expr::arrow(Expr::variable(x), eval(value))
    }

    #[test]
    fn test_numeric_system() {
        let eqs = equations(&["2*x + 4*y == 8", "x == 2*y + 3"]);
        assert_eq!(
            solve(&eqs, &vars(&["x", "y"])).unwrap(),
            vec![arrow("x", "7/2"), arrow("y", "1/4")]
        );
    }

    #[test]
    fn test_symbolic_system() {
        let eqs = equations(&["2*x + 4*y == A", "x == 2*y + B"]);
        assert_eq!(
            solve(&eqs, &vars(&["x", "y"])).unwrap(),
            vec![arrow("x", "A/4 + B/2"), arrow("y", "A/8 - B/4")]
        );
    }

    #[test]
    fn test_partial_solve_is_triangular() {
        let eqs = equations(&["2*x + 4*y == 8", "x == 2*y + 3"]);
        assert_eq!(
            partial_solve(&eqs, &vars(&["x", "y"])).unwrap(),
            vec![arrow("x", "7/2"), arrow("y", "2 - x/2")]
        );
    }

    #[test]
    fn test_underdetermined_returns_fewer() {
        let eqs = equations(&["x + y + z == 1", "z == 2"]);
        let solutions = solve(&eqs, &vars(&["x", "y", "z"])).unwrap();
        assert!(solutions.contains(&arrow("z", "2")));
        assert!(solutions.len() < 3);
    }

    #[test]
    fn test_not_an_equation() {
        assert!(matches!(
            solve(&equations(&["x > 1"]), &vars(&["x"])),
            Err(CasError::NotAnEquation { .. })
        ));
    }

    #[test]
    fn test_partitioned_solve() {
        let eqs = equations(&["x + y == 3", "z == 5", "x - y == 1"]);
        let solver = Solver::new().partition(true);
        let mut solutions = solver.solve(&eqs, &vars(&["x", "y", "z"])).unwrap();
        solutions.sort_by_key(ToString::to_string);
        assert_eq!(
            solutions,
            vec![arrow("x", "2"), arrow("y", "1"), arrow("z", "5")]
        );
    }

    #[test]
    fn test_partial_pivoting_with_pivotless_leading_column() {
        let eqs = equations(&["y == 1"]);
        let xy = vars(&["x", "y"]);
        let expected = vec![arrow("y", "1")];
        assert_eq!(Solver::new().full_pivoting(false).solve(&eqs, &xy).unwrap(), expected);
        assert_eq!(Solver::new().solve(&eqs, &xy).unwrap(), expected);
    }

    #[test]
    fn test_solutions_satisfy_equations() {
        let eqs = equations(&["3*x - y + 2*z == 1", "x + y == a", "x - z == 0"]);
        let solutions = solve(&eqs, &vars(&["x", "y", "z"])).unwrap();
        assert_eq!(solutions.len(), 3);
        for eq in &eqs {
            let (l, r) = eq.as_equation().unwrap();
            let residual = crate::evaluate::expand(&Expr::sub_expr(l.clone(), r.clone()).substitute(&solutions));
            assert!(residual.is_zero(), "residual {residual}");
        }
    }
}
