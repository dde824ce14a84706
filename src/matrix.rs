//! Matrix operations on [`ExprKind::Matrix`] expressions.
//!
//! Elements are arbitrary expressions; every result is evaluated. Expressions
//! that are not matrices are treated as `1x1` matrices.

use crate::core::{CasError, Expr, ExprKind};
use crate::evaluate::{Evaluator, expand};

/// Row-major view of a matrix expression
struct View<'a> {
    rows: usize,
    cols: usize,
    elements: Vec<&'a Expr>,
}

fn view(m: &Expr) -> View<'_> {
    match &m.kind {
        ExprKind::Matrix {
            rows,
            cols,
            elements,
        } => View {
            rows: *rows,
            cols: *cols,
            elements: elements.iter().map(|e| &**e).collect(),
        },
        _ => View {
            rows: 1,
            cols: 1,
            elements: vec![m],
        },
    }
}

impl View<'_> {
    fn at(&self, i: usize, j: usize) -> &Expr {
        self.elements[i * self.cols + j]
    }

    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn to_rows(&self) -> Vec<Vec<Expr>> {
        (0..self.rows)
            .map(|i| (0..self.cols).map(|j| self.at(i, j).clone()).collect())
            .collect()
    }
}

fn from_rows(rows: &[Vec<Expr>]) -> Expr {
    let cols = rows.first().map_or(0, Vec::len);
    Expr::matrix_from_fn(rows.len(), cols, |i, j| rows[i][j].clone())
}

/// `(rows, cols)` of `m`
#[must_use]
pub fn shape(m: &Expr) -> (usize, usize) {
    view(m).shape()
}

/// The `n x n` identity matrix
#[must_use]
pub fn identity(n: usize) -> Expr {
    Expr::matrix_from_fn(n, n, |i, j| if i == j { Expr::one() } else { Expr::zero() })
}

#[must_use]
pub fn transpose(m: &Expr) -> Expr {
    let v = view(m);
    Expr::matrix_from_fn(v.cols, v.rows, |i, j| v.at(j, i).clone())
}

/// Element `(i, j)`, zero-based
#[must_use]
pub fn get(m: &Expr, i: usize, j: usize) -> Option<Expr> {
    let v = view(m);
    (i < v.rows && j < v.cols).then(|| v.at(i, j).clone())
}

/// Row `i` as a `1 x cols` matrix
#[must_use]
pub fn row(m: &Expr, i: usize) -> Option<Expr> {
    let v = view(m);
    (i < v.rows).then(|| Expr::matrix_from_fn(1, v.cols, |_, j| v.at(i, j).clone()))
}

/// Column `j` as a `rows x 1` matrix
#[must_use]
pub fn column(m: &Expr, j: usize) -> Option<Expr> {
    let v = view(m);
    (j < v.cols).then(|| Expr::matrix_from_fn(v.rows, 1, |i, _| v.at(i, j).clone()))
}

/// Element-wise sum
///
/// # Errors
/// `DimensionMismatch` when the shapes differ.
pub fn add(a: &Expr, b: &Expr) -> Result<Expr, CasError> {
    let (va, vb) = (view(a), view(b));
    if va.shape() != vb.shape() {
        return Err(CasError::DimensionMismatch {
            expected: va.shape(),
            got: vb.shape(),
        });
    }
    let mut evaluator = Evaluator::new();
    Ok(Expr::matrix_from_fn(va.rows, va.cols, |i, j| {
        evaluator.evaluate(&Expr::add_expr(va.at(i, j).clone(), vb.at(i, j).clone()))
    }))
}

/// Matrix product
///
/// # Errors
/// `DimensionMismatch` when `a` has a different number of columns than `b` has rows.
pub fn mul(a: &Expr, b: &Expr) -> Result<Expr, CasError> {
    let (va, vb) = (view(a), view(b));
    if va.cols != vb.rows {
        return Err(CasError::DimensionMismatch {
            expected: (va.cols, vb.cols),
            got: vb.shape(),
        });
    }
    let mut evaluator = Evaluator::new();
    Ok(Expr::matrix_from_fn(va.rows, vb.cols, |i, j| {
        let terms = (0..va.cols)
            .map(|k| Expr::mul_expr(va.at(i, k).clone(), vb.at(k, j).clone()))
            .collect();
        evaluator.evaluate(&Expr::sum(terms))
    }))
}

/// Multiply every element by `k`
#[must_use]
pub fn scale(m: &Expr, k: &Expr) -> Expr {
    let v = view(m);
    let mut evaluator = Evaluator::new();
    Expr::matrix_from_fn(v.rows, v.cols, |i, j| {
        evaluator.evaluate(&Expr::mul_expr(k.clone(), v.at(i, j).clone()))
    })
}

fn require_square(v: &View<'_>) -> Result<usize, CasError> {
    if v.rows == v.cols {
        Ok(v.rows)
    } else {
        Err(CasError::NotSquare {
            rows: v.rows,
            cols: v.cols,
        })
    }
}

/// Determinant.
///
/// Constant matrices are reduced by elimination; symbolic ones use cofactor
/// expansion along the first row, which keeps the result polynomial in the
/// elements.
///
/// # Errors
/// `NotSquare` for non-square input.
pub fn determinant(m: &Expr) -> Result<Expr, CasError> {
    let v = view(m);
    let n = require_square(&v)?;
    if v.elements.iter().all(|e| e.is_constant()) {
        return Ok(eliminate_determinant(v.to_rows(), n));
    }
    Ok(expand(&cofactor_determinant(&v.to_rows())))
}

fn eliminate_determinant(mut rows: Vec<Vec<Expr>>, n: usize) -> Expr {
    let mut evaluator = Evaluator::new();
    let mut det = Expr::one();
    for col in 0..n {
        let Some(p) = (col..n).find(|&r| !rows[r][col].is_zero()) else {
            return Expr::zero();
        };
        if p != col {
            rows.swap(p, col);
            det = det.negate();
        }
        let pivot = rows[col][col].clone();
        det = evaluator.evaluate(&Expr::mul_expr(det, pivot.clone()));
        let pivot_row = rows[col].clone();
        for r in rows.iter_mut().skip(col + 1) {
            subtract_multiple(r, &pivot_row, &pivot, col, &mut evaluator);
        }
    }
    det
}

fn cofactor_determinant(rows: &[Vec<Expr>]) -> Expr {
    match rows.len() {
        0 => Expr::one(),
        1 => rows[0][0].clone(),
        n => {
            let terms = (0..n)
                .filter(|&j| !rows[0][j].is_zero())
                .map(|j| {
                    let minor: Vec<Vec<Expr>> = rows[1..]
                        .iter()
                        .map(|r| {
                            r.iter()
                                .enumerate()
                                .filter(|&(k, _)| k != j)
                                .map(|(_, e)| e.clone())
                                .collect()
                        })
                        .collect();
                    let term = Expr::mul_expr(rows[0][j].clone(), cofactor_determinant(&minor));
                    if j % 2 == 0 { term } else { term.negate() }
                })
                .collect();
            Expr::sum(terms)
        }
    }
}

/// `target -= source * (target[col] / pivot)`
fn subtract_multiple(
    target: &mut [Expr],
    source: &[Expr],
    pivot: &Expr,
    col: usize,
    evaluator: &mut Evaluator,
) {
    if target[col].is_zero() {
        return;
    }
    let factor = evaluator.evaluate(&Expr::div_expr(target[col].clone(), pivot.clone()));
    for (t, s) in target.iter_mut().zip(source) {
        let product = Expr::mul_expr(factor.clone(), s.clone());
        *t = evaluator.evaluate(&Expr::sub_expr(t.clone(), product));
    }
}

/// Inverse by Gauss-Jordan elimination on `[m | I]`.
///
/// Pivots are evaluated; a constant non-zero pivot is preferred over a
/// symbolic one.
///
/// # Errors
/// `NotSquare` for non-square input, `SingularMatrix` when some column has no
/// non-zero pivot.
pub fn inverse(m: &Expr) -> Result<Expr, CasError> {
    let v = view(m);
    let n = require_square(&v)?;
    let mut evaluator = Evaluator::new();
    let mut rows: Vec<Vec<Expr>> = v
        .to_rows()
        .into_iter()
        .enumerate()
        .map(|(i, mut r)| {
            r.iter_mut().for_each(|e| *e = evaluator.evaluate(e));
            r.extend((0..n).map(|j| if i == j { Expr::one() } else { Expr::zero() }));
            r
        })
        .collect();

    for col in 0..n {
        let candidates = || (col..n).filter(|&r| !rows[r][col].is_zero());
        let p = candidates()
            .find(|&r| rows[r][col].is_constant())
            .or_else(|| candidates().next())
            .ok_or(CasError::SingularMatrix)?;
        rows.swap(p, col);

        let pivot = rows[col][col].clone();
        let normalized: Vec<Expr> = rows[col]
            .iter()
            .map(|e| evaluator.evaluate(&Expr::div_expr(e.clone(), pivot.clone())))
            .collect();
        rows[col] = normalized;

        let pivot_row = rows[col].clone();
        let one = Expr::one();
        for (r, target) in rows.iter_mut().enumerate() {
            if r != col {
                subtract_multiple(target, &pivot_row, &one, col, &mut evaluator);
            }
        }
    }

    let inverse: Vec<Vec<Expr>> = rows.into_iter().map(|r| r[n..].to_vec()).collect();
    Ok(from_rows(&inverse))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::evaluate::evaluate;
    use crate::parser::parse;

    fn m(rows: &[&[&str]]) -> Expr {
        Expr::matrix(
            rows.iter()
                .map(|r| r.iter().map(|e| evaluate(&parse(e).unwrap())).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_identity_and_transpose() {
        let a = m(&[&["1", "2", "3"], &["4", "5", "6"]]);
        assert_eq!(shape(&transpose(&a)), (3, 2));
        assert_eq!(get(&transpose(&a), 2, 0), Some(Expr::integer(3)));
        assert_eq!(mul(&identity(2), &a).unwrap(), a);
        assert_eq!(get(&a, 2, 0), None);
    }

    #[test]
    fn test_rows_and_columns() {
        let a = m(&[&["1", "2"], &["3", "4"]]);
        assert_eq!(row(&a, 1), Some(m(&[&["3", "4"]])));
        assert_eq!(column(&a, 0), Some(m(&[&["1"], &["3"]])));
        assert_eq!(row(&a, 2), None);
    }

    #[test]
    fn test_shape_errors() {
        let a = m(&[&["1", "2"]]);
        let b = m(&[&["1", "2"], &["3", "4"]]);
        assert!(matches!(add(&a, &b), Err(CasError::DimensionMismatch { .. })));
        assert!(matches!(mul(&b, &a), Err(CasError::DimensionMismatch { .. })));
        assert!(matches!(determinant(&a), Err(CasError::NotSquare { rows: 1, cols: 2 })));
        assert!(mul(&a, &b).is_ok());
    }

    #[test]
    fn test_add_and_scale() {
        let a = m(&[&["x", "1"]]);
        assert_eq!(add(&a, &a).unwrap(), m(&[&["2*x", "2"]]));
        assert_eq!(scale(&a, &Expr::variable("y")), m(&[&["x*y", "y"]]));
    }

    #[test]
    fn test_determinant() {
        assert_eq!(
            determinant(&m(&[&["2", "1"], &["4", "3"]])).unwrap(),
            Expr::integer(2)
        );
        assert_eq!(
            determinant(&m(&[&["0", "1"], &["1", "0"]])).unwrap(),
            Expr::integer(-1)
        );
        assert_eq!(
            determinant(&m(&[&["a", "b"], &["c", "d"]])).unwrap(),
            evaluate(&parse("a*d - b*c").unwrap())
        );
    }

    #[test]
    fn test_inverse() {
        let a = m(&[&["2", "1"], &["4", "3"]]);
        let inv = inverse(&a).unwrap();
        assert_eq!(inv, m(&[&["3/2", "-1/2"], &["-2", "1"]]));
        assert_eq!(mul(&a, &inv).unwrap(), identity(2));
        assert!(matches!(
            inverse(&m(&[&["1", "2"], &["2", "4"]])),
            Err(CasError::SingularMatrix)
        ));
    }
}
