//! A linear system over a list of unknowns, reduced in place

use std::cmp::Ordering as CmpOrdering;

use tracing::debug;

use crate::core::{BinaryOp, CasError, Expr, ExprKind, Real};
use crate::evaluate::Evaluator;

use super::LinearCombination;

/// Equations as rows over the unknown basis.
///
/// The order of `unknowns` is the column order; full pivoting permutes it.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemOfEquations {
    equations: Vec<LinearCombination>,
    unknowns: Vec<Expr>,
}

/// How good a coefficient is as a pivot
#[derive(Debug, Clone)]
struct PivotScore {
    /// `|c|` when the coefficient is a constant
    magnitude: Option<Real>,
    /// Markowitz cost, `(row_nnz - 1) * (col_nnz - 1)`
    cost: usize,
}

impl PivotScore {
    /// Constant pivots beat symbolic ones, then larger magnitude, then lower cost
    fn beats(&self, other: &Self) -> bool {
        match (&self.magnitude, &other.magnitude) {
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => match a.total_cmp(b) {
                CmpOrdering::Greater => true,
                CmpOrdering::Less => false,
                CmpOrdering::Equal => self.cost < other.cost,
            },
            (None, None) => self.cost < other.cost,
        }
    }
}

impl SystemOfEquations {
    /// Build the rows of `equations` over `unknowns`.
    ///
    /// `a == b` becomes the row `a - b`; any expression that is not a relation
    /// or a set is taken as `expr == 0`.
    ///
    /// # Errors
    /// `NotAnEquation` for other relations, arrows, logical operators and sets.
    pub fn new(equations: &[Expr], unknowns: &[Expr]) -> Result<Self, CasError> {
        let rows = equations
            .iter()
            .map(|eq| {
                let lhs = equation_lhs(eq)?;
                Ok(LinearCombination::from_expr(unknowns, &lhs))
            })
            .collect::<Result<Vec<_>, CasError>>()?;
        Ok(Self {
            equations: rows,
            unknowns: unknowns.to_vec(),
        })
    }

    fn from_parts(equations: Vec<LinearCombination>, unknowns: Vec<Expr>) -> Self {
        Self { equations, unknowns }
    }

    #[must_use]
    pub fn equations(&self) -> &[LinearCombination] {
        &self.equations
    }

    #[must_use]
    pub fn unknowns(&self) -> &[Expr] {
        &self.unknowns
    }

    /// True when no equations remain
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    // ===== Row reduction =====

    /// Gaussian elimination to row echelon form.
    ///
    /// Columns without a usable pivot are skipped. With `full_pivoting` the
    /// pivot may come from any remaining column, which reorders `unknowns`.
    /// `pivot_conditions` are arrows substituted into coefficients when scoring
    /// them; the stored coefficients are not changed.
    pub fn row_reduce(&mut self, full_pivoting: bool, pivot_conditions: &[Expr]) {
        let mut evaluator = Evaluator::new();
        let mut row = 0;
        for j in 0..self.unknowns.len() {
            if row >= self.equations.len() {
                break;
            }
            let columns = if full_pivoting {
                j..self.unknowns.len()
            } else {
                j..j + 1
            };
            let Some((pivot_row, pivot_col)) =
                self.find_pivot(row, columns, pivot_conditions, &mut evaluator)
            else {
                continue;
            };

            self.equations.swap(row, pivot_row);
            self.unknowns.swap(j, pivot_col);
            let x = self.unknowns[j].clone();
            debug!(
                unknown = %x,
                pivot = %self.equations[row].coefficient(&x),
                row,
                "solver pivot"
            );

            let pivot = self.equations[row].clone();
            for target in &mut self.equations[row + 1..] {
                eliminate(&pivot, target, &x, &mut evaluator);
            }
            row += 1;
        }
    }

    fn find_pivot(
        &self,
        row: usize,
        columns: std::ops::Range<usize>,
        pivot_conditions: &[Expr],
        evaluator: &mut Evaluator,
    ) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, PivotScore)> = None;
        for c in columns {
            let x = &self.unknowns[c];
            let col_nnz = self.equations[row..]
                .iter()
                .filter(|eq| !eq.coefficient(x).is_zero())
                .count();
            for (r, eq) in self.equations.iter().enumerate().skip(row) {
                let coefficient = eq.coefficient(x);
                if coefficient.is_zero() {
                    continue;
                }
                let scored = if pivot_conditions.is_empty() {
                    coefficient
                } else {
                    evaluator.evaluate(&coefficient.substitute(pivot_conditions))
                };
                // Zero under the supplied conditions
                if scored.is_zero() {
                    continue;
                }
                let row_nnz = self
                    .unknowns
                    .iter()
                    .filter(|u| !eq.coefficient(u).is_zero())
                    .count();
                let score = PivotScore {
                    magnitude: scored.as_constant().map(Real::abs),
                    cost: row_nnz.saturating_sub(1) * col_nnz.saturating_sub(1),
                };
                if best.as_ref().is_none_or(|(_, _, b)| score.beats(b)) {
                    best = Some((r, c, score));
                }
            }
        }
        best.map(|(r, c, _)| (r, c))
    }

    // ===== Back substitution =====

    /// Eliminate each pivoted column from the rows above its pivot row, last
    /// column first, leaving the system in reduced row echelon form
    pub fn back_substitute(&mut self) {
        let mut evaluator = Evaluator::new();
        let n = self.unknowns.len().min(self.equations.len());
        let Some(mut i) = n.checked_sub(1) else {
            return;
        };
        // Skipped columns push later pivots past `n`, so every column is visited
        for j in (0..self.unknowns.len()).rev() {
            loop {
                if !self.leading_columns_clear(i, j) {
                    break;
                }
                let x = self.unknowns[j].clone();
                if !self.equations[i].coefficient(&x).is_zero() {
                    let pivot = self.equations[i].clone();
                    for target in &mut self.equations[..i] {
                        eliminate(&pivot, target, &x, &mut evaluator);
                    }
                    break;
                }
                match i.checked_sub(1) {
                    Some(prev) => i = prev,
                    None => return,
                }
            }
        }
    }

    /// Whether row `i` has no entry in any column before `j`
    fn leading_columns_clear(&self, i: usize, j: usize) -> bool {
        self.unknowns[..j]
            .iter()
            .all(|u| self.equations[i].coefficient(u).is_zero())
    }

    // ===== Extraction =====

    /// Extract solutions from a reduced system, last pivoted column first.
    ///
    /// A solution `x -> s` is accepted when `s` does not depend on an unknown
    /// that is still unsolved. Its row and unknown are then removed, so the
    /// system keeps only what could not be solved.
    pub fn solve(&mut self) -> Vec<Expr> {
        let mut solutions = Vec::new();
        let n = self.unknowns.len().min(self.equations.len());
        let Some(mut i) = n.checked_sub(1) else {
            return solutions;
        };
        'columns: for j in (0..self.unknowns.len()).rev() {
            loop {
                if !self.leading_columns_clear(i, j) {
                    break;
                }
                let x = self.unknowns[j].clone();
                if let Ok(s) = self.equations[i].solve_for(&x) {
                    let others: Vec<Expr> =
                        self.unknowns.iter().filter(|u| **u != x).cloned().collect();
                    if !s.depends_on_any(&others) {
                        debug!(unknown = %x, solution = %s, "solver accepted solution");
                        solutions.push(Expr::arrow(x, s));
                        self.equations.remove(i);
                        self.unknowns.remove(j);
                        match i.checked_sub(1) {
                            Some(prev) => i = prev,
                            None => break 'columns,
                        }
                    }
                    break;
                }
                match i.checked_sub(1) {
                    Some(prev) => i = prev,
                    None => break 'columns,
                }
            }
        }
        solutions
    }

    // ===== Partitioning =====

    /// Split into independent sub-systems.
    ///
    /// Two equations belong together when they share an unknown, closed
    /// transitively. Every returned system has at least one equation; equations
    /// mentioning no unknown and unknowns mentioned by no equation are dropped.
    #[must_use]
    pub fn partition(&self) -> Vec<Self> {
        let touches: Vec<Vec<usize>> = self
            .equations
            .iter()
            .map(|eq| {
                (0..self.unknowns.len())
                    .filter(|&u| eq.depends_on(std::slice::from_ref(&self.unknowns[u])))
                    .collect()
            })
            .collect();

        let mut parent: Vec<usize> = (0..self.unknowns.len()).collect();
        for unknowns in &touches {
            if let Some((&first, rest)) = unknowns.split_first() {
                for &u in rest {
                    let (a, b) = (find_root(&mut parent, first), find_root(&mut parent, u));
                    parent[a] = b;
                }
            }
        }

        let mut groups: Vec<(usize, Vec<LinearCombination>)> = Vec::new();
        for (eq, unknowns) in self.equations.iter().zip(&touches) {
            let Some(&first) = unknowns.first() else {
                continue;
            };
            let root = find_root(&mut parent, first);
            match groups.iter_mut().find(|(r, _)| *r == root) {
                Some((_, rows)) => rows.push(eq.clone()),
                None => groups.push((root, vec![eq.clone()])),
            }
        }

        let systems: Vec<Self> = groups
            .into_iter()
            .map(|(root, rows)| {
                let unknowns = (0..self.unknowns.len())
                    .filter(|&u| find_root(&mut parent, u) == root)
                    .map(|u| self.unknowns[u].clone())
                    .collect();
                Self::from_parts(rows, unknowns)
            })
            .collect();
        debug!(
            parts = systems.len(),
            sizes = ?systems.iter().map(|s| s.equations.len()).collect::<Vec<_>>(),
            "solver partition"
        );
        systems
    }
}

/// `t -= s * (t[p] / s[p])`, leaving `t[p]` exactly zero
fn eliminate(s: &LinearCombination, t: &mut LinearCombination, p: &Expr, evaluator: &mut Evaluator) {
    let tp = t.coefficient(p);
    if tp.is_zero() {
        return;
    }
    let scale = evaluator.evaluate(&Expr::div_expr(tp, s.coefficient(p)).negate());
    t.add_scaled(s, &scale);
    t.set(p.clone(), Expr::zero());
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// The expression that must vanish for `eq` to hold
fn equation_lhs(eq: &Expr) -> Result<Expr, CasError> {
    match &eq.kind {
        ExprKind::Binary {
            op: BinaryOp::Equal,
            left,
            right,
        } => Ok(Expr::sub_expr((**left).clone(), (**right).clone())),
        ExprKind::Binary { .. } | ExprKind::Set(_) => Err(CasError::NotAnEquation {
            expr: eq.to_string(),
        }),
        _ => Ok(eq.clone()),
    }
}
